// parse nginx `ui_short` log format:
//
// log_format ui_short '$remote_addr  $remote_user $http_x_real_ip [$time_local] "$request" '
//                     '$status $body_bytes_sent "$http_referer" '
//                     '"$http_user_agent" "$http_x_forwarded_for" "$http_X_REQUEST_ID" "$http_X_RB_USER" '
//                     '$request_time';

use once_cell::sync::Lazy;
use regex::Regex;

use super::{LogParser, ParsedEntry};

static UI_SHORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:^|[\s"])GET\s+(?P<url>[^\s"]+)"?\s(?:.*\s)?(?P<time>\d+\.\d+)$"#)
        .expect("ui_short pattern is valid")
});

#[derive(Default)]
pub struct UiShortParser {}

impl LogParser for UiShortParser {
    fn parse(&self, line: &str) -> Option<ParsedEntry> {
        let caps = UI_SHORT_RE.captures(line.trim_end())?;
        let duration: f64 = caps["time"].parse().ok()?;
        if !duration.is_finite() {
            return None;
        }
        Some(ParsedEntry {
            url: caps["url"].to_string(),
            duration,
        })
    }
}
