//! 台北时区当前时间
//!
//! 用具名时区而非固定偏移，夏令时规则交给 tz 数据库处理。

use chrono::Utc;
use chrono_tz::Asia::Taipei;

/// 现在时间的 ISO-8601 字符串（如 `2025-06-15T20:00:00+08:00`）
///
/// 提示词里以此为基准，让 Agent 解析「明天」、「下週一」等模糊时间。
pub fn now_taipei() -> String {
    Utc::now().with_timezone(&Taipei).to_rfc3339()
}
