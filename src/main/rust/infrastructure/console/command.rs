use anyhow::{anyhow, bail, Context, Result};

use crate::domain::value_objects::{ColorSpace, Direction, TransportKind};

/// One console command. Row numbers are 1-based, as printed by `list`.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    List,
    Sources(TransportKind),
    Create(BridgeRequest),
    Edit { row: usize, request: BridgeRequest },
    Remove { row: usize },
    Stats { row: usize },
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BridgeRequest {
    pub direction: Direction,
    pub source_name: String,
    pub bridge_name: String,
    pub color_space: ColorSpace,
}

pub const HELP: &str = "\
Commands:
  list                                         show active bridges
  sources <shm|net>                            list discoverable sources
  create <direction> <source> <name> [color]   start a bridge
  edit <row> <direction> <source> <name> [color]
                                               replace the bridge at <row>
  remove <row>                                 stop and remove a bridge
  stats <row>                                  relay counters of a bridge
  help                                         show this text
  quit                                         stop all bridges and exit
Directions: shm-to-net, net-to-shm. Colors: RGBA (default), BGRA, UYVY.
Quote names containing spaces: create shm-to-net \"Arena Out\" 0.0.0.0:5960";

impl Command {
    /// Parse one input line; `Ok(None)` for a blank line
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let tokens = tokenize(line)?;
        let Some((verb, args)) = tokens.split_first() else {
            return Ok(None);
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "list" | "ls" => {
                expect_args(verb, args, 0, 0)?;
                Self::List
            }
            "sources" => {
                expect_args(verb, args, 1, 1)?;
                Self::Sources(args[0].parse()?)
            }
            "create" | "add" => {
                expect_args(verb, args, 3, 4)?;
                Self::Create(BridgeRequest::from_args(args)?)
            }
            "edit" => {
                expect_args(verb, args, 4, 5)?;
                Self::Edit {
                    row: parse_row(&args[0])?,
                    request: BridgeRequest::from_args(&args[1..])?,
                }
            }
            "remove" | "rm" => {
                expect_args(verb, args, 1, 1)?;
                Self::Remove {
                    row: parse_row(&args[0])?,
                }
            }
            "stats" => {
                expect_args(verb, args, 1, 1)?;
                Self::Stats {
                    row: parse_row(&args[0])?,
                }
            }
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => bail!("unknown command '{}', try 'help'", other),
        };
        Ok(Some(command))
    }
}

impl BridgeRequest {
    fn from_args(args: &[String]) -> Result<Self> {
        let color_space = match args.get(3) {
            Some(color) => color.parse()?,
            None => ColorSpace::default(),
        };
        Ok(Self {
            direction: args[0].parse()?,
            source_name: args[1].clone(),
            bridge_name: args[2].clone(),
            color_space,
        })
    }
}

fn expect_args(verb: &str, args: &[String], min: usize, max: usize) -> Result<()> {
    if args.len() < min || args.len() > max {
        bail!("wrong number of arguments for '{}', try 'help'", verb);
    }
    Ok(())
}

fn parse_row(value: &str) -> Result<usize> {
    let row: usize = value
        .parse()
        .with_context(|| format!("'{}' is not a row number", value))?;
    if row == 0 {
        bail!("rows are numbered from 1");
    }
    Ok(row)
}

/// Split on whitespace; double quotes group words and `\"` escapes a quote
fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quoted = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' if quoted => {
                let escaped = chars.next().ok_or_else(|| anyhow!("dangling escape"))?;
                current.push(escaped);
            }
            '"' => {
                quoted = !quoted;
                in_token = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if quoted {
        bail!("unterminated quote");
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}
