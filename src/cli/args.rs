//! CLI argument parsing

#[derive(Debug, Clone)]
pub struct CliArgs {
    pub command: Command,
}

#[derive(Debug, Clone)]
pub enum Command {
    List(ListArgs),
    Copy(TransferArgs),
    Move(TransferArgs),
    Watch(WatchArgs),
}

#[derive(Debug, Clone)]
pub struct ListArgs {
    pub paths: Vec<String>,
    pub trash: bool,
    pub sort: String,
    pub desc: bool,
    pub no_folders_first: bool,
    pub filter: Option<String>,
    pub case_sensitive: bool,
    pub settings: Option<String>,
    pub json: bool,
}

impl Default for ListArgs {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            trash: false,
            sort: "name".to_string(),
            desc: false,
            no_folders_first: false,
            filter: None,
            case_sensitive: false,
            settings: None,
            json: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransferArgs {
    pub sources: Vec<String>,
    pub destination: String,
    pub on_conflict: Option<String>,
    pub quiet: bool,
}

#[derive(Debug, Clone)]
pub struct WatchArgs {
    pub path: String,
    pub duration_secs: Option<u64>,
    pub json: bool,
}

/// Parse command line arguments
pub fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    if args.len() < 2 {
        return Err("No command specified".to_string());
    }

    let command = match args[1].as_str() {
        "list" => Command::List(parse_list_args(&args[2..])?),
        "copy" => Command::Copy(parse_transfer_args(&args[2..])?),
        "move" => Command::Move(parse_transfer_args(&args[2..])?),
        "watch" => Command::Watch(parse_watch_args(&args[2..])?),
        _ => return Err(format!("Unknown command: {}", args[1])),
    };

    Ok(CliArgs { command })
}

fn parse_list_args(args: &[String]) -> Result<ListArgs, String> {
    let mut list_args = ListArgs::default();
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "--trash" => {
                list_args.trash = true;
            }
            "--sort" => {
                i += 1;
                if i >= args.len() {
                    return Err("--sort requires a value".to_string());
                }
                list_args.sort.clone_from(&args[i]);
            }
            "--desc" => {
                list_args.desc = true;
            }
            "--no-folders-first" => {
                list_args.no_folders_first = true;
            }
            "--filter" => {
                i += 1;
                if i >= args.len() {
                    return Err("--filter requires a value".to_string());
                }
                list_args.filter = Some(args[i].clone());
            }
            "--case-sensitive" => {
                list_args.case_sensitive = true;
            }
            "--settings" => {
                i += 1;
                if i >= args.len() {
                    return Err("--settings requires a file path".to_string());
                }
                list_args.settings = Some(args[i].clone());
            }
            "--json" => {
                list_args.json = true;
            }
            arg if !arg.starts_with("--") => {
                list_args.paths.push(arg.to_string());
            }
            _ => return Err(format!("Unknown option: {}", args[i])),
        }
        i += 1;
    }

    if list_args.paths.is_empty() {
        return Err("Missing required argument: PATH".to_string());
    }

    Ok(list_args)
}

fn parse_transfer_args(args: &[String]) -> Result<TransferArgs, String> {
    let mut transfer_args = TransferArgs::default();
    let mut positional: Vec<String> = Vec::new();
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "--on-conflict" => {
                i += 1;
                if i >= args.len() {
                    return Err("--on-conflict requires a value".to_string());
                }
                transfer_args.on_conflict = Some(args[i].clone());
            }
            "--quiet" => {
                transfer_args.quiet = true;
            }
            arg if !arg.starts_with("--") => {
                positional.push(arg.to_string());
            }
            _ => return Err(format!("Unknown option: {}", args[i])),
        }
        i += 1;
    }

    if positional.len() < 2 {
        return Err("Expected at least one SOURCE and a DESTINATION".to_string());
    }
    transfer_args.destination = positional.pop().unwrap_or_default();
    transfer_args.sources = positional;

    Ok(transfer_args)
}

fn parse_watch_args(args: &[String]) -> Result<WatchArgs, String> {
    let mut path = String::new();
    let mut duration_secs = None;
    let mut json = false;
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "--duration" => {
                i += 1;
                if i >= args.len() {
                    return Err("--duration requires a value".to_string());
                }
                let secs: u64 = args[i]
                    .parse()
                    .map_err(|_| "--duration must be a positive integer".to_string())?;
                if secs == 0 {
                    return Err("--duration must be greater than zero".to_string());
                }
                duration_secs = Some(secs);
            }
            "--json" => {
                json = true;
            }
            arg if !arg.starts_with("--") => {
                if path.is_empty() {
                    path = arg.to_string();
                } else {
                    return Err(format!("Unexpected argument: {arg}"));
                }
            }
            _ => return Err(format!("Unknown option: {}", args[i])),
        }
        i += 1;
    }

    if path.is_empty() {
        return Err("Missing required argument: PATH".to_string());
    }

    Ok(WatchArgs {
        path,
        duration_secs,
        json,
    })
}
