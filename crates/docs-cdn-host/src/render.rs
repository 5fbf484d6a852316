//! HTML of the Swagger UI, ReDoc and OAuth2 redirect pages

use crate::asset::AssetUrls;
use html_escape::{encode_double_quoted_attribute as attr, encode_text};
use serde_json::{Map, Value};
use std::fmt::Write as _;

/// Google Fonts stylesheet requested by ReDoc
const REDOC_FONTS: &str =
    "https://fonts.googleapis.com/css?family=Montserrat:300,400,700|Roboto:300,400,700";

/// Swagger UI parameters every page starts from
pub fn default_swagger_ui_parameters() -> Map<String, Value> {
    let mut parameters = Map::new();
    parameters.insert("dom_id".into(), "#swagger-ui".into());
    parameters.insert("layout".into(), "BaseLayout".into());
    parameters.insert("deepLinking".into(), true.into());
    parameters.insert("showExtensions".into(), true.into());
    parameters.insert("showCommonExtensions".into(), true.into());
    parameters
}

/// Documentation settings of an application, captured for rendering
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageSettings {
    /// Application title
    pub title: String,
    /// OpenAPI document URL, before root-path adjustment
    pub openapi_url: String,
    /// OAuth2 redirect URL of Swagger UI
    pub oauth2_redirect_url: Option<String>,
    /// Options passed to `ui.initOAuth`
    pub init_oauth: Option<Value>,
    /// Swagger UI parameters overriding the defaults
    pub swagger_ui_parameters: Option<Map<String, Value>>,
}

impl PageSettings {
    /// Render the Swagger UI page
    pub fn swagger_ui(&self, urls: &AssetUrls, root_path: &str) -> String {
        let root = root_path.trim_end_matches('/');
        let title = format!("{} - Swagger UI", self.title);
        let title = encode_text(&title);
        let mut html = String::from("<!DOCTYPE html>\n<html>\n<head>\n");
        let _ = writeln!(
            html,
            r#"<link type="text/css" rel="stylesheet" href="{}">"#,
            attr(&urls.css)
        );
        if let Some(favicon) = &urls.favicon {
            let _ = writeln!(html, r#"<link rel="shortcut icon" href="{}">"#, attr(favicon));
        }
        let _ = writeln!(html, "<title>{title}</title>\n</head>\n<body>");
        html.push_str("<div id=\"swagger-ui\">\n</div>\n");
        let _ = writeln!(html, r#"<script src="{}"></script>"#, attr(&urls.js));
        html.push_str("<script>\nconst ui = SwaggerUIBundle({\n");
        let _ = writeln!(html, "    url: {},", script_json(&format!("{root}{}", self.openapi_url)));

        let mut parameters = default_swagger_ui_parameters();
        if let Some(extra) = &self.swagger_ui_parameters {
            parameters.extend(extra.clone());
        }
        for (key, value) in &parameters {
            let _ = writeln!(html, "    {}: {},", script_json(key), script_json(value));
        }
        if let Some(redirect) = &self.oauth2_redirect_url {
            let _ = writeln!(
                html,
                "    oauth2RedirectUrl: window.location.origin + {},",
                script_json(&format!("{root}{redirect}"))
            );
        }
        html.push_str(
            "    presets: [\n        SwaggerUIBundle.presets.apis,\n        \
             SwaggerUIBundle.SwaggerUIStandalonePreset\n    ],\n})\n",
        );
        if let Some(init_oauth) = &self.init_oauth {
            let _ = writeln!(html, "ui.initOAuth({})", script_json(init_oauth));
        }
        html.push_str("</script>\n</body>\n</html>\n");
        html
    }

    /// Render the ReDoc page
    pub fn redoc(&self, urls: &AssetUrls, root_path: &str) -> String {
        let root = root_path.trim_end_matches('/');
        let title = format!("{} - ReDoc", self.title);
        let title = encode_text(&title);
        let mut html = String::from("<!DOCTYPE html>\n<html>\n<head>\n");
        let _ = writeln!(html, "<title>{title}</title>");
        html.push_str("<meta charset=\"utf-8\"/>\n");
        html.push_str(
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
        );
        let _ = writeln!(html, r#"<link href="{REDOC_FONTS}" rel="stylesheet">"#);
        if let Some(favicon) = &urls.favicon {
            let _ = writeln!(html, r#"<link rel="shortcut icon" href="{}">"#, attr(favicon));
        }
        html.push_str("<style>\n  body {\n    margin: 0;\n    padding: 0;\n  }\n</style>\n");
        html.push_str("</head>\n<body>\n");
        html.push_str(
            "<noscript>\n    ReDoc requires Javascript to function. \
             Please enable it to browse the documentation.\n</noscript>\n",
        );
        let _ = writeln!(
            html,
            r#"<redoc spec-url="{}"></redoc>"#,
            attr(&format!("{root}{}", self.openapi_url))
        );
        let _ = writeln!(html, r#"<script src="{}"> </script>"#, attr(&urls.redoc));
        html.push_str("</body>\n</html>\n");
        html
    }
}

/// Page receiving the OAuth2 authorization response for Swagger UI
pub fn oauth2_redirect_html() -> &'static str {
    r#"<!doctype html>
<html lang="en-US">
<head>
    <title>Swagger UI: OAuth2 Redirect</title>
</head>
<body>
<script>
    'use strict';
    function run () {
        var oauth2 = window.opener.swaggerUIRedirectOauth2;
        var sentState = oauth2.state;
        var redirectUrl = oauth2.redirectUrl;
        var isValid, qp, arr;

        if (/code|token|error/.test(window.location.hash)) {
            qp = window.location.hash.substring(1).replace('?', '&');
        } else {
            qp = location.search.substring(1);
        }

        arr = qp.split("&");
        arr.forEach(function (v,i,_arr) { _arr[i] = '"' + v.replace('=', '":"') + '"';});
        qp = qp ? JSON.parse('{' + arr.join() + '}',
                function (key, value) {
                    return key === "" ? value : decodeURIComponent(value);
                }
        ) : {};

        isValid = qp.state === sentState;

        if ((
          oauth2.auth.schema.get("flow") === "accessCode" ||
          oauth2.auth.schema.get("flow") === "authorizationCode" ||
          oauth2.auth.schema.get("flow") === "authorization_code"
        ) && !oauth2.auth.code) {
            if (!isValid) {
                oauth2.errCb({
                    authId: oauth2.auth.name,
                    source: "auth",
                    level: "warning",
                    message: "Authorization may be unsafe, passed state was changed in server. The passed state wasn't returned from auth server."
                });
            }

            if (qp.code) {
                delete oauth2.state;
                oauth2.auth.code = qp.code;
                oauth2.callback({auth: oauth2.auth, redirectUrl: redirectUrl});
            } else {
                let oauthErrorMsg;
                if (qp.error) {
                    oauthErrorMsg = "["+qp.error+"]: " +
                        (qp.error_description ? qp.error_description+ ". " : "no accessCode received from the server. ") +
                        (qp.error_uri ? "More info: "+qp.error_uri : "");
                }

                oauth2.errCb({
                    authId: oauth2.auth.name,
                    source: "auth",
                    level: "error",
                    message: oauthErrorMsg || "[Authorization failed]: no accessCode received from the server."
                });
            }
        } else {
            oauth2.callback({auth: oauth2.auth, token: qp, isValid: isValid, redirectUrl: redirectUrl});
        }
        window.close();
    }

    if (document.readyState !== 'loading') {
        run();
    } else {
        document.addEventListener('DOMContentLoaded', function () {
            run();
        });
    }
</script>
</body>
</html>
"#
}

/// JSON literal safe to embed in a `<script>` element
fn script_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace("</", "<\\/")
}
