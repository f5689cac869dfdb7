use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// 一组问答
///
/// `id` 由调用方分配，不校验唯一性；缺省时在日志中显示为 `?`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub question: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub answer: String,
}

impl QaPair {
    pub fn new(id: u64, question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            id: Some(id.to_string()),
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// 日志中使用的编号
    pub fn label(&self) -> &str {
        self.id.as_deref().unwrap_or("?")
    }
}

/// 一次完整的访谈会话，追加写入的最小单位
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub timestamp: String,
    pub pairs: Vec<QaPair>,
}

impl Session {
    pub fn new(timestamp: impl Into<String>, pairs: Vec<QaPair>) -> Self {
        Self {
            timestamp: timestamp.into(),
            pairs,
        }
    }

    /// 时间戳缺省或为空时使用当前 UTC 时间
    pub fn with_optional_timestamp(timestamp: Option<String>, pairs: Vec<QaPair>) -> Self {
        let timestamp = timestamp
            .filter(|ts| !ts.trim().is_empty())
            .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true));
        Self { timestamp, pairs }
    }
}

/// `id` 可能是数字、字符串或布尔值，一律按原样转成文本，不做校验
fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string, number or boolean id")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn id_accepts_numbers_and_strings() {
        let pairs: Vec<QaPair> = serde_json::from_value(json!([
            {"id": 3, "question": "Why?", "answer": "Because"},
            {"id": "7", "question": "How?"},
            {"question": null, "answer": null}
        ]))
        .unwrap();

        assert_eq!(pairs[0].label(), "3");
        assert_eq!(pairs[1].label(), "7");
        assert_eq!(pairs[1].answer, "");
        assert_eq!(pairs[2].label(), "?");
        assert_eq!(pairs[2].question, "");
    }

    #[test]
    fn fractional_and_boolean_ids_are_kept_as_text() {
        let pairs: Vec<QaPair> = serde_json::from_value(json!([
            {"id": 1.5, "question": "Half?", "answer": "Yes"},
            {"id": true, "question": "Flag?"}
        ]))
        .unwrap();

        assert_eq!(pairs[0].label(), "1.5");
        assert_eq!(pairs[1].label(), "true");
    }

    #[test]
    fn missing_timestamp_defaults_to_utc_now() {
        let session = Session::with_optional_timestamp(Some("  ".to_string()), vec![]);
        assert!(session.timestamp.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&session.timestamp).is_ok());

        let session = Session::with_optional_timestamp(Some("2024-05-01T10:00:00".to_string()), vec![]);
        assert_eq!(session.timestamp, "2024-05-01T10:00:00");
    }
}
