//! Line commands typed at the picker prompt and their central dispatch.

use std::sync::Arc;

use client_core::{ScrollMetrics, SearchController, TermAnnotation};

#[derive(Debug, Clone, PartialEq)]
pub enum PickerCommand {
    Query(String),
    ToggleTag(String),
    NextPage,
    PrevPage,
    MoreTags,
    Scroll(ScrollMetrics),
    Pick(String),
    Show,
    Help,
    Quit,
}

impl PickerCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (verb, rest) = line
            .split_once(char::is_whitespace)
            .map(|(verb, rest)| (verb, rest.trim()))
            .unwrap_or((line, ""));

        match verb {
            "q" | "query" => Ok(Self::Query(rest.to_string())),
            "t" | "tag" if !rest.is_empty() => Ok(Self::ToggleTag(rest.to_string())),
            "n" | "next" => Ok(Self::NextPage),
            "p" | "prev" => Ok(Self::PrevPage),
            "m" | "more" => Ok(Self::MoreTags),
            "scroll" => parse_scroll(rest).map(Self::Scroll),
            "pick" if !rest.is_empty() => Ok(Self::Pick(rest.to_string())),
            "" | "show" => Ok(Self::Show),
            "h" | "help" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            _ => Err(format!("unrecognised command: {line}")),
        }
    }
}

fn parse_scroll(rest: &str) -> Result<ScrollMetrics, String> {
    let numbers: Vec<f64> = rest
        .split_whitespace()
        .map(|part| part.parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|err| format!("scroll expects three numbers: {err}"))?;
    match numbers.as_slice() {
        [scroll_height, scroll_top, client_height] => Ok(ScrollMetrics {
            scroll_height: *scroll_height,
            scroll_top: *scroll_top,
            client_height: *client_height,
        }),
        _ => Err("usage: scroll <height> <top> <client-height>".to_string()),
    }
}

pub enum Outcome {
    Continue,
    Picked(TermAnnotation),
    Message(String),
    Quit,
}

pub async fn dispatch(
    controller: &Arc<SearchController>,
    command: PickerCommand,
    selected_text: &str,
) -> Outcome {
    let command_name = match &command {
        PickerCommand::Query(_) => "query",
        PickerCommand::ToggleTag(_) => "toggle_tag",
        PickerCommand::NextPage => "next_page",
        PickerCommand::PrevPage => "prev_page",
        PickerCommand::MoreTags => "more_tags",
        PickerCommand::Scroll(_) => "scroll",
        PickerCommand::Pick(_) => "pick",
        PickerCommand::Show => "show",
        PickerCommand::Help => "help",
        PickerCommand::Quit => "quit",
    };
    tracing::debug!(command = command_name, "dispatching picker command");

    match command {
        PickerCommand::Query(text) => controller.set_query(&text).await,
        PickerCommand::ToggleTag(name) => controller.toggle_tag(&name).await,
        PickerCommand::NextPage => {
            if !controller.request_next_term_page().await {
                return Outcome::Message("no next page".into());
            }
        }
        PickerCommand::PrevPage => {
            if !controller.request_prev_term_page().await {
                return Outcome::Message("no previous page".into());
            }
        }
        PickerCommand::MoreTags => {
            if !controller.request_more_tags().await {
                return Outcome::Message("no more tags".into());
            }
        }
        PickerCommand::Scroll(metrics) => {
            controller.on_tag_scroll(metrics).await;
        }
        PickerCommand::Pick(raw_id) => {
            return match controller.select_term(&raw_id, selected_text).await {
                Ok(annotation) => Outcome::Picked(annotation),
                Err(err) => Outcome::Message(err.to_string()),
            };
        }
        PickerCommand::Show => {}
        PickerCommand::Help => return Outcome::Message(HELP.to_string()),
        PickerCommand::Quit => return Outcome::Quit,
    }
    Outcome::Continue
}

pub const HELP: &str = "\
commands:
  q <text>        search terms
  t <tag>         toggle a tag filter
  n / p           next / previous result page
  m               load more tags
  scroll <h> <top> <client-h>
                  report tag list scroll position
  pick <id>       choose a term and exit
  show            redraw
  quit            close without choosing";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_verbs_and_arguments() {
        assert_eq!(
            PickerCommand::parse("q  cell wall "),
            Ok(PickerCommand::Query("cell wall".into()))
        );
        assert_eq!(PickerCommand::parse("q"), Ok(PickerCommand::Query(String::new())));
        assert_eq!(
            PickerCommand::parse("t biology"),
            Ok(PickerCommand::ToggleTag("biology".into()))
        );
        assert_eq!(PickerCommand::parse(""), Ok(PickerCommand::Show));
        assert_eq!(PickerCommand::parse("pick 7"), Ok(PickerCommand::Pick("7".into())));
        assert!(PickerCommand::parse("t").is_err());
        assert!(PickerCommand::parse("dance").is_err());
    }

    #[test]
    fn scroll_needs_three_numbers() {
        assert_eq!(
            PickerCommand::parse("scroll 1000 550 400"),
            Ok(PickerCommand::Scroll(ScrollMetrics {
                scroll_height: 1000.0,
                scroll_top: 550.0,
                client_height: 400.0,
            }))
        );
        assert!(PickerCommand::parse("scroll 1 2").is_err());
        assert!(PickerCommand::parse("scroll a b c").is_err());
    }
}
