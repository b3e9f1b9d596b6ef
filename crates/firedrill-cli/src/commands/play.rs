//! `play`: terminal client for a running gateway.
//!
//! Events are printed as they stream in. Each typed line is sent as a
//! command; `say <text>` chats with the narrating persona.

use std::time::Duration;

use anyhow::{Result, anyhow};
use firedrill_gateway::IncidentRpcClient;
use firedrill_runtime::split_line;
use jsonrpsee::ws_client::WsClientBuilder;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use crate::render::{EventRenderer, command_result};
use crate::theme::Theme;

/// What a typed line asks for.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Empty,
    Quit,
    Say(String),
    Command(String, Vec<String>),
}

impl Input {
    fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if let Some(text) = trimmed.strip_prefix("say ") {
            return Self::Say(text.trim().to_string());
        }
        match split_line(trimmed) {
            None => Self::Empty,
            Some((command, _)) if matches!(command.as_str(), "quit" | "exit") => Self::Quit,
            Some((command, args)) => Self::Command(command, args),
        }
    }
}

/// Connect and run until the operator quits or the gateway goes away.
pub(crate) async fn run(url: &str) -> Result<()> {
    let client = WsClientBuilder::default()
        .connection_timeout(Duration::from_secs(5))
        .build(url)
        .await
        .map_err(|e| anyhow!("Failed to connect to gateway at {url}: {e}"))?;
    let mut events = client.subscribe_events().await?;
    let mut renderer = EventRenderer::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!(
        "{}",
        Theme::dimmed("Type a command ('help' lists them), 'say <text>' to chat, 'quit' to leave.")
    );

    loop {
        tokio::select! {
            event = events.next() => match event {
                Some(Ok(event)) => {
                    if let Some(text) = renderer.render(&event) {
                        println!("{text}");
                    }
                },
                Some(Err(e)) => warn!(error = %e, "undecodable event"),
                None => {
                    println!("{}", Theme::error("Connection to the gateway closed"));
                    break;
                },
            },
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match Input::parse(&line) {
                    Input::Empty => {},
                    Input::Quit => break,
                    Input::Say(text) => client.send_message(text).await?,
                    Input::Command(command, args) => {
                        let result = client.execute_command(command, args).await?;
                        println!("{}", command_result(&result));
                    },
                }
            },
        }
    }

    let _ = events.unsubscribe().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_lines() {
        assert_eq!(Input::parse("   "), Input::Empty);
        assert_eq!(Input::parse("quit"), Input::Quit);
        assert_eq!(Input::parse(" exit "), Input::Quit);
        assert_eq!(
            Input::parse("say is apac safe?"),
            Input::Say("is apac safe?".into())
        );
        assert_eq!(
            Input::parse("patch us-east 6.6.0-2"),
            Input::Command("patch".into(), vec!["us-east".into(), "6.6.0-2".into()])
        );
    }
}
