//! 事件记录、行事历链接与确认卡片
//!
//! 纯函数层：EventRecord -> Google 行事历深链 / 卡片描述，无任何 I/O。
//! 活动一律按一小时计：Agent 不回传时长，结束时间固定为开始后一小时。

use chrono::{Duration, NaiveDateTime};

use crate::core::BridgeError;

pub const CALENDAR_RENDER_URL: &str = "https://calendar.google.com/calendar/render";
pub const EVENT_LOCATION: &str = "Taipei";

const START_FORMAT: &str = "%Y-%m-%dT%H:%M";
const GCAL_FORMAT: &str = "%Y%m%dT%H%M";

/// 结构化事件：date 为 YYYY-MM-DD，time 为 HH:mm
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub title: String,
    pub date: String,
    pub time: String,
    pub note: String,
}

impl EventRecord {
    /// note 为空时代入 "none" 标记
    pub fn new(
        title: impl Into<String>,
        date: impl Into<String>,
        time: impl Into<String>,
        note: impl Into<String>,
    ) -> Self {
        let note = note.into();
        Self {
            title: title.into(),
            date: date.into(),
            time: time.into(),
            note: if note.is_empty() { "none".to_string() } else { note },
        }
    }

    /// 开始时间 = date + time
    pub fn start(&self) -> Result<NaiveDateTime, BridgeError> {
        let stamp = format!("{}T{}", self.date, self.time);
        NaiveDateTime::parse_from_str(&stamp, START_FORMAT)
            .map_err(|e| BridgeError::MalformedTimestamp(format!("{}: {}", stamp, e)))
    }

    /// 结束时间 = 开始 + 一小时
    pub fn end(&self) -> Result<NaiveDateTime, BridgeError> {
        Ok(self.start()? + Duration::hours(1))
    }
}

/// 生成 Google 行事历新增事件链接
///
/// title 与 note 经百分号编码；dates 参数为 `YYYYMMDDTHHMM/YYYYMMDDTHHMM`。
pub fn calendar_link(record: &EventRecord) -> Result<String, BridgeError> {
    let start = record.start()?;
    let end = record.end()?;
    Ok(format!(
        "{}?action=TEMPLATE&text={}&details={}&location={}&dates={}/{}&sf=true&openExternalBrowser=1",
        CALENDAR_RENDER_URL,
        urlencoding::encode(&record.title),
        urlencoding::encode(&record.note),
        EVENT_LOCATION,
        start.format(GCAL_FORMAT),
        end.format(GCAL_FORMAT),
    ))
}

/// 确认卡片描述：标题栏、四行内容、一个打开行事历链接的主按钮
#[derive(Debug, Clone, PartialEq)]
pub struct EventCard {
    pub header: String,
    pub lines: Vec<String>,
    pub action_label: String,
    pub link: String,
}

/// 由事件记录生成确认卡片
pub fn build_card(record: &EventRecord) -> Result<EventCard, BridgeError> {
    let link = calendar_link(record)?;
    Ok(EventCard {
        header: "事件確認".to_string(),
        lines: vec![
            format!("標題：{}", record.title),
            format!("日期：{}", record.date),
            format!("時間：{}", record.time),
            format!("備註：{}", record.note),
        ],
        action_label: "新增到行事曆".to_string(),
        link,
    })
}
