//! Address-bar encoding of the navigation state.
//!
//! The location is a query string carrying `prefix` (URL-escaped) and
//! `explore` (the panel-open flag). Other parameters are passed through.

pub const PREFIX_PARAM: &str = "prefix";
pub const PANEL_PARAM: &str = "explore";

/// The part of the navigation state mirrored in the address bar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub prefix: String,
    pub panel_open: bool,
}

impl Location {
    pub fn new(prefix: impl Into<String>, panel_open: bool) -> Self {
        Self { prefix: prefix.into(), panel_open }
    }

    /// Parse a query string, with or without the leading `?`.
    pub fn parse(search: &str) -> Self {
        let params = parse_params(search);
        let get = |name: &str| {
            params
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        };

        Self {
            prefix: get(PREFIX_PARAM).unwrap_or_default().to_string(),
            panel_open: get(PANEL_PARAM) == Some("true"),
        }
    }

    /// Render this location on top of `current`, keeping unrelated params.
    pub fn to_query_string(&self, current: &str) -> String {
        let mut params = parse_params(current);
        set_param(&mut params, PREFIX_PARAM, &self.prefix);
        set_param(&mut params, PANEL_PARAM, if self.panel_open { "true" } else { "false" });

        let search = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("?{}", search)
    }
}

fn parse_params(search: &str) -> Vec<(String, String)> {
    search
        .trim_start_matches('?')
        .split('&')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (key, value) = part.split_once('=').unwrap_or((part, ""));
            let value = urlencoding::decode(value)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.to_string());
            (key.to_string(), value)
        })
        .collect()
}

fn set_param(params: &mut Vec<(String, String)>, key: &str, value: &str) {
    match params.iter_mut().find(|(k, _)| k == key) {
        Some((_, v)) => *v = value.to_string(),
        None => params.push((key.to_string(), value.to_string())),
    }
}
