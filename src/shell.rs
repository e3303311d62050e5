//! Line-oriented shell standing in for the presentation layer.
//!
//! Reads one command per line from stdin, drives [`CloudClipboard`] and
//! renders notifications as they arrive.

use anyhow::{anyhow, bail, Context};
use cc_app::CloudClipboard;
use cc_core::{EntryId, LocalView, Notification, NotificationLevel, ViewHealth};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::bootstrap::WiredApp;

const HELP: &str = "\
commands:
  signup <email> <password>   create an account and sign in
  login <email> <password>    sign in
  logout                      sign out
  add <text...>               save text to the history
  list                        show entries (newest first)
  copy <n>                    copy entry #n to the system clipboard
  select <n>                  toggle entry #n for deletion
  delete                      ask to delete the selected entries
  confirm <password>          confirm the pending delete
  cancel                      dismiss the pending delete
  fault subscribe <count>     fail the next <count> live-query attempts
  fault add <count>           fail the next <count> writes
  fault interrupt             drop every open live query
  fault offline on|off        take the identity service offline
  help                        show this text
  quit                        exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SignUp { email: String, password: String },
    LogIn { email: String, password: String },
    LogOut,
    Add(String),
    List,
    Copy(usize),
    Select(usize),
    Delete,
    Confirm(String),
    Cancel,
    Fault(Fault),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    Subscribe(u32),
    Add(u32),
    Interrupt,
    Offline(bool),
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> anyhow::Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let args: Vec<&str> = rest.split_whitespace().collect();

    let command = match (verb, args.as_slice()) {
        ("signup", [email, password]) => Command::SignUp {
            email: email.to_string(),
            password: password.to_string(),
        },
        ("login", [email, password]) => Command::LogIn {
            email: email.to_string(),
            password: password.to_string(),
        },
        ("logout", []) => Command::LogOut,
        // Keep the text as typed; the entry store decides what counts as empty.
        ("add", _) => Command::Add(rest.to_string()),
        ("list", []) => Command::List,
        ("copy", [n]) => Command::Copy(parse_index(n)?),
        ("select", [n]) => Command::Select(parse_index(n)?),
        ("delete", []) => Command::Delete,
        ("confirm", [password]) => Command::Confirm(password.to_string()),
        ("cancel", []) => Command::Cancel,
        ("fault", ["subscribe", n]) => Command::Fault(Fault::Subscribe(parse_count(n)?)),
        ("fault", ["add", n]) => Command::Fault(Fault::Add(parse_count(n)?)),
        ("fault", ["interrupt"]) => Command::Fault(Fault::Interrupt),
        ("fault", ["offline", "on"]) => Command::Fault(Fault::Offline(true)),
        ("fault", ["offline", "off"]) => Command::Fault(Fault::Offline(false)),
        ("help", _) => Command::Help,
        ("quit" | "exit", []) => Command::Quit,
        (verb, _) => bail!("unrecognized command {verb:?}; type `help`"),
    };
    Ok(Some(command))
}

fn parse_index(raw: &str) -> anyhow::Result<usize> {
    let n: usize = raw
        .parse()
        .with_context(|| format!("expected an entry number, got {raw:?}"))?;
    if n == 0 {
        bail!("entry numbers start at 1");
    }
    Ok(n)
}

fn parse_count(raw: &str) -> anyhow::Result<u32> {
    raw.parse()
        .with_context(|| format!("expected a count, got {raw:?}"))
}

/// Render the view the way `list` prints it.
pub fn render_view(view: &LocalView, is_selected: impl Fn(&EntryId) -> bool) -> String {
    let mut out = String::new();
    if let ViewHealth::Degraded {
        consecutive_failures,
    } = view.health
    {
        out.push_str(&format!(
            "!! live sync degraded ({consecutive_failures} failed attempts), showing last known entries\n"
        ));
    }
    if view.owner.is_none() {
        out.push_str("(signed out)\n");
        return out;
    }
    if view.is_empty() {
        out.push_str("(no entries)\n");
        return out;
    }
    for (index, entry) in view.entries.iter().enumerate() {
        let mark = if is_selected(&entry.id) { "x" } else { " " };
        let when = entry
            .created_at
            .to_datetime()
            .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!("{:>3}. [{mark}] {when}  {}\n", index + 1, entry.text));
    }
    out
}

fn render_notification(notification: &Notification) -> String {
    let tag = match notification.level {
        NotificationLevel::Success => "ok",
        NotificationLevel::Warning => "warn",
        NotificationLevel::Error => "error",
    };
    format!("[{tag}] {}", notification.message)
}

fn entry_at(app: &CloudClipboard, n: usize) -> anyhow::Result<EntryId> {
    app.view()
        .entries
        .get(n - 1)
        .map(|entry| entry.id.clone())
        .ok_or_else(|| anyhow!("no entry #{n}; run `list`"))
}

/// Execute one command. Returns `false` when the shell should exit.
///
/// Outcomes of app actions are reported through notifications, so their
/// errors are not propagated here.
pub async fn execute(wired: &WiredApp, command: Command) -> anyhow::Result<bool> {
    let app = &wired.app;
    debug!(?command, "shell command");
    match command {
        Command::SignUp { email, password } => {
            let _ = app.sign_up(&email, &password).await;
        }
        Command::LogIn { email, password } => {
            let _ = app.sign_in(&email, &password).await;
        }
        Command::LogOut => app.sign_out(),
        Command::Add(text) => {
            let _ = app.save(&text).await;
        }
        Command::List => {
            let selection = app.selection();
            print!("{}", render_view(&app.view(), |id| selection.contains(id)));
        }
        Command::Copy(n) => {
            let id = entry_at(app, n)?;
            let _ = app.copy(&id);
        }
        Command::Select(n) => {
            let id = entry_at(app, n)?;
            let selected = app.toggle_selection(&id)?;
            println!(
                "#{n} {} ({} selected)",
                if selected { "selected" } else { "unselected" },
                app.selection().len()
            );
        }
        Command::Delete => {
            if app.request_delete().is_ok() {
                println!(
                    "delete {} entries? enter `confirm <password>` or `cancel`",
                    app.selection().len()
                );
            }
        }
        Command::Confirm(password) => {
            let _ = app.confirm_delete(&password).await;
        }
        Command::Cancel => {
            let _ = app.cancel_delete();
        }
        Command::Fault(fault) => apply_fault(wired, fault),
        Command::Help => println!("{HELP}"),
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

fn apply_fault(wired: &WiredApp, fault: Fault) {
    info!(?fault, "Injecting fault");
    match fault {
        Fault::Subscribe(count) => wired.document_store.fail_next_subscribes(count),
        Fault::Add(count) => wired.document_store.fail_next_adds(count),
        Fault::Interrupt => {
            let interrupted = wired
                .document_store
                .interrupt_queries(None, "connection reset by shell");
            println!("interrupted {interrupted} live queries");
        }
        Fault::Offline(offline) => wired.identity_service.set_offline(offline),
    }
}

fn spawn_renderer(mut notifications: mpsc::UnboundedReceiver<Notification>) {
    tokio::spawn(async move {
        while let Some(notification) = notifications.recv().await {
            println!("{}", render_notification(&notification));
        }
    });
}

/// Run the shell until `quit` or end of input.
pub async fn run(
    wired: WiredApp,
    notifications: mpsc::UnboundedReceiver<Notification>,
) -> anyhow::Result<()> {
    spawn_renderer(notifications);

    println!("cloudclip shell; type `help` for commands");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                println!("{err:#}");
                continue;
            }
        };
        match execute(&wired, command).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => println!("{err:#}"),
        }
    }

    wired.app.sign_out();
    info!("Shell exited");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_core::{Entry, ServerTimestamp, UserId};

    #[test]
    fn parses_session_commands() {
        assert_eq!(
            parse_command("signup a@x.io hunter22").unwrap(),
            Some(Command::SignUp {
                email: "a@x.io".into(),
                password: "hunter22".into()
            })
        );
        assert_eq!(parse_command("  logout ").unwrap(), Some(Command::LogOut));
        assert_eq!(parse_command("").unwrap(), None);
    }

    #[test]
    fn add_keeps_the_rest_of_the_line() {
        assert_eq!(
            parse_command("add  hello   world ").unwrap(),
            Some(Command::Add("hello   world".into()))
        );
        assert_eq!(parse_command("add").unwrap(), Some(Command::Add(String::new())));
    }

    #[test]
    fn rejects_bad_indices_and_unknown_verbs() {
        assert!(parse_command("copy 0").is_err());
        assert!(parse_command("select two").is_err());
        assert!(parse_command("login onlyemail").is_err());
        assert!(parse_command("frobnicate").is_err());
    }

    #[test]
    fn parses_faults() {
        assert_eq!(
            parse_command("fault subscribe 3").unwrap(),
            Some(Command::Fault(Fault::Subscribe(3)))
        );
        assert_eq!(
            parse_command("fault offline on").unwrap(),
            Some(Command::Fault(Fault::Offline(true)))
        );
        assert!(parse_command("fault offline maybe").is_err());
    }

    #[test]
    fn renders_selection_and_degraded_banner() {
        let owner = UserId::from("u1");
        let view = LocalView {
            owner: Some(owner.clone()),
            entries: vec![
                Entry {
                    id: EntryId::from("b"),
                    owner_id: owner.clone(),
                    text: "note B".into(),
                    created_at: ServerTimestamp::from_epoch_millis(2_000),
                },
                Entry {
                    id: EntryId::from("a"),
                    owner_id: owner,
                    text: "note A".into(),
                    created_at: ServerTimestamp::from_epoch_millis(1_000),
                },
            ],
            health: ViewHealth::Degraded {
                consecutive_failures: 6,
            },
            ..LocalView::empty()
        };

        let out = render_view(&view, |id| id.as_str() == "a");
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].contains("degraded"));
        assert!(lines[1].starts_with("  1. [ ]") && lines[1].ends_with("note B"));
        assert!(lines[2].starts_with("  2. [x]") && lines[2].ends_with("note A"));
    }

    #[test]
    fn renders_signed_out_view() {
        assert_eq!(render_view(&LocalView::empty(), |_| false), "(signed out)\n");
    }

    #[test]
    fn notification_tags_follow_level() {
        assert_eq!(
            render_notification(&Notification::error("Incorrect password")),
            "[error] Incorrect password"
        );
    }
}
