/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a client-side order id.
///
/// Orders are created on the admin device before the remote store has seen
/// them, so ids must be globally unique without coordination.
pub fn new_order_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Generate a command/event id
pub fn new_event_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Format a Unix-millis timestamp in local time for display.
///
/// Falls back to the raw number when the value is out of chrono's range.
pub fn format_millis(ts: i64) -> String {
    use chrono::{Local, TimeZone};

    match Local.timestamp_millis_opt(ts).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => ts.to_string(),
    }
}
