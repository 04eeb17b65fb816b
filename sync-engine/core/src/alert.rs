//! Webhook alerting for out-of-sync targets.
//!
//! The saved patch script is parsed back into statements and posted to a
//! Feishu-style webhook as a rich text message. Bodies over the message size
//! limit are split on line boundaries and sent in numbered batches.

use crate::error::CoreResult;
use serde::Serialize;
use std::time::Duration;

const ALERT_TITLE: &str = "分库表结构不一致告警";
const BATCH_TITLE_SUFFIX: &str = "【数据长度超出限制，分批次发送】";
const MESSAGE_SIZE_LIMIT: usize = 20_000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Post the statements of a patch script to the webhook.
pub async fn send_alert(webhook_url: &str, target_addr: &str, statements: &[String]) -> CoreResult<()> {
    let body = render_alert_body(target_addr, statements)?;

    tracing::info!("{body}");

    let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
    let chunks = chunk_message(&body, MESSAGE_SIZE_LIMIT);

    if chunks.len() == 1 {
        post_message(&client, webhook_url, ALERT_TITLE, chunks[0]).await?;
    } else {
        for (i, chunk) in chunks.iter().enumerate() {
            let title = format!("{ALERT_TITLE}{BATCH_TITLE_SUFFIX}【第 {} 批】", i + 1);
            post_message(&client, webhook_url, &title, chunk).await?;
        }
    }

    Ok(())
}

/// The SQL statements of a saved script: everything below the seven header
/// lines, with the foreign key guards taken out.
pub fn alert_lines_from_script(contents: &str) -> Vec<String> {
    let mut lines: Vec<String> = contents.lines().skip(7).map(ToOwned::to_owned).collect();

    for guard in ["SET FOREIGN_KEY_CHECKS = 0;", "SET FOREIGN_KEY_CHECKS = 1;"] {
        if let Some(position) = lines.iter().position(|line| line == guard) {
            lines.remove(position);
        }
    }

    lines
}

#[derive(Serialize)]
struct AlertBody<'a> {
    #[serde(rename = "目标实例")]
    target_instance: &'a str,
    #[serde(rename = "同步SQL")]
    sync_sql: &'a [String],
}

fn render_alert_body(target_addr: &str, statements: &[String]) -> CoreResult<String> {
    let body = AlertBody {
        target_instance: target_addr,
        sync_sql: statements,
    };

    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    body.serialize(&mut serializer)?;

    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Split `msg` into chunks of at most `limit` bytes, preferring to break on
/// line boundaries. Every byte ends up in some chunk.
fn chunk_message(msg: &str, limit: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;

    while msg.len() - start > limit {
        let mut end = start + limit;
        while !msg.is_char_boundary(end) {
            end -= 1;
        }

        let split_at = match msg[start..end].rfind('\n') {
            Some(0) | None => end,
            Some(position) => start + position,
        };

        chunks.push(&msg[start..split_at]);
        start = if msg[split_at..].starts_with('\n') {
            split_at + 1
        } else {
            split_at
        };
    }

    chunks.push(&msg[start..]);

    chunks
}

#[derive(Serialize)]
struct FeishuMessage<'a> {
    msg_type: &'static str,
    content: MessageContent<'a>,
}

#[derive(Serialize)]
struct MessageContent<'a> {
    post: Post<'a>,
}

#[derive(Serialize)]
struct Post<'a> {
    zh_cn: PostBody<'a>,
}

#[derive(Serialize)]
struct PostBody<'a> {
    title: &'a str,
    content: Vec<Vec<ContentElement<'a>>>,
}

#[derive(Serialize)]
#[serde(tag = "tag", rename_all = "snake_case")]
enum ContentElement<'a> {
    Text { text: &'a str },
    At { user_id: &'static str },
}

async fn post_message(client: &reqwest::Client, url: &str, title: &str, text: &str) -> CoreResult<()> {
    let message = FeishuMessage {
        msg_type: "post",
        content: MessageContent {
            post: Post {
                zh_cn: PostBody {
                    title,
                    content: vec![vec![
                        ContentElement::Text { text },
                        ContentElement::At { user_id: "all" },
                    ]],
                },
            },
        },
    };

    let payload = serde_json::to_string(&message)?;
    let response = client
        .post(url)
        .header(reqwest::header::CONTENT_TYPE, "application/json;charset=utf-8")
        .body(payload)
        .send()
        .await?;
    let response_text = response.text().await?;

    tracing::info!("[SEND_MSG_TO_FEI_SHU_RESULT] {response_text}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn alert_body_is_indented_json() {
        let statements = vec!["USE `biz`;".to_owned(), "DROP TABLE `old`;".to_owned()];
        let body = render_alert_body("db1.example.com:3306/biz", &statements).unwrap();

        let expected = indoc! {r#"
            {
                "目标实例": "db1.example.com:3306/biz",
                "同步SQL": [
                    "USE `biz`;",
                    "DROP TABLE `old`;"
                ]
            }"#};

        assert_eq!(body, expected);
    }

    #[test]
    fn script_lines_skip_the_header_and_foreign_key_guards() {
        let script = "--\n-- Schema Sync 0.1.0 Patch Script\n-- Created: Sun, Aug 23, 2026\n-- Server Version: 8.0.32\n-- Apply To: db1.example.com:3306/biz\n--\n\nUSE `biz`;\nSET FOREIGN_KEY_CHECKS = 0;\nDROP TABLE `old`;\nSET FOREIGN_KEY_CHECKS = 1;\n";

        let lines = alert_lines_from_script(script);

        assert_eq!(lines, &["USE `biz`;", "DROP TABLE `old`;"]);
    }

    #[test]
    fn script_lines_survive_missing_guards() {
        let script = "--\n--\n--\n--\n--\n--\n\nUSE `biz`;\nDROP TABLE `old`;\n";

        let lines = alert_lines_from_script(script);

        assert_eq!(lines, &["USE `biz`;", "DROP TABLE `old`;"]);
    }

    #[test]
    fn short_messages_are_sent_in_one_chunk() {
        let chunks = chunk_message("hello\nworld", 100);

        assert_eq!(chunks, &["hello\nworld"]);
    }

    #[test]
    fn chunking_breaks_on_line_boundaries_and_keeps_the_tail() {
        let msg = "aaaa\nbbbb\ncccc\ndddd";

        let chunks = chunk_message(msg, 12);

        assert_eq!(chunks, &["aaaa\nbbbb", "cccc\ndddd"]);
        assert_eq!(chunks.concat().len() + 1, msg.len());
    }

    #[test]
    fn chunking_never_splits_multibyte_characters() {
        let msg = "目标实例目标实例目标实例";

        let chunks = chunk_message(msg, 7);

        assert!(chunks.len() > 1);
        assert_eq!(chunks.concat(), msg);
    }
}
