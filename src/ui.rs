use std::io;

use anyhow::Result;
use termion::event::Key;
use termion::input::MouseTerminal;
use termion::raw::IntoRawMode;
use termion::screen::AlternateScreen;
use tui::backend::TermionBackend;
use tui::layout::{Constraint, Direction, Layout};
use tui::style::{Color, Modifier, Style};
use tui::widgets::{Block, Borders, List, ListState, Paragraph, Text};
use tui::Terminal;

use crate::clipboard;
use crate::event::{Event, Events};
use crate::executor::{CancellationToken, Executor, MainLoop, ProcessResult, CANCELLED};
use crate::session::Session;

const HELP: &str = "</> search, <Tab> switch view, <↑/↓> move, <→/Enter> open, <←> up, \
                    <c> copy, <r> refresh, <x> cancel, <d> dismiss, <q> quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    All,
    Folders,
}

#[derive(Debug)]
struct Detail {
    name: String,
    body: String,
}

#[derive(Debug)]
struct Pending {
    id: u64,
    name: String,
    token: CancellationToken,
}

/// Everything the browser shows. Lives on the UI thread; process completions
/// reach it through the main loop.
#[derive(Debug)]
pub struct Browser {
    session: Session,
    view: View,
    selected: usize,
    searching: bool,
    detail: Option<Detail>,
    status: String,
    banners: Vec<String>,
    pending: Vec<Pending>,
    next_id: u64,
    seen_generation: u64,
}

impl Browser {
    pub fn new(session: Session) -> Self {
        Browser {
            session,
            view: View::All,
            selected: 0,
            searching: false,
            detail: None,
            status: String::new(),
            banners: Vec::new(),
            pending: Vec::new(),
            next_id: 0,
            seen_generation: 0,
        }
    }

    fn refresh(&mut self) {
        self.banners.clear();
        match self.session.refresh() {
            Ok(count) => self.status = format!("{} entries", count),
            Err(err) => {
                self.status = String::from("Store could not be loaded");
                self.banners.push(err.to_string());
            }
        }
        self.banners
            .extend(self.session.diagnostics().iter().map(ToString::to_string));
    }

    /// Rows of the current view: label and whether it is a folder.
    fn rows(&self) -> Vec<(String, bool)> {
        match self.view {
            View::All => self
                .session
                .visible_entries()
                .into_iter()
                .map(|entry| (entry.name.clone(), false))
                .collect(),
            View::Folders => self
                .session
                .folder()
                .items()
                .map(|(name, is_dir)| (name.to_owned(), is_dir))
                .collect(),
        }
    }

    fn breadcrumb(&self) -> String {
        std::iter::once("Password Store")
            .chain(self.session.path().iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" / ")
    }

    fn clamp_selection(&mut self) {
        if self.seen_generation != self.session.generation() {
            self.seen_generation = self.session.generation();
            self.selected = 0;
        }
        let len = self.rows().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    fn reveal(&mut self, executor: &Executor<Browser>, name: String) {
        let invocation = match self.session.reveal_invocation(&name) {
            Ok(invocation) => invocation,
            Err(err) => {
                self.banners.push(err.to_string());
                return;
            }
        };

        let id = self.next_id;
        self.next_id += 1;
        let token = CancellationToken::new();
        self.pending.push(Pending {
            id,
            name: name.clone(),
            token: token.clone(),
        });
        self.status = format!("Loading {}…", name);

        executor.run(invocation, token, move |browser, result| {
            browser.on_revealed(id, name, result)
        });
    }

    fn on_revealed(&mut self, id: u64, name: String, result: ProcessResult) {
        self.pending.retain(|pending| pending.id != id);

        if result.success() {
            self.detail = Some(Detail {
                name,
                body: result.stdout,
            });
            self.status = String::from("Loaded.");
        } else if result.exit_code == CANCELLED {
            self.status = format!("Cancelled {}", name);
        } else {
            self.status = format!("Error opening {}", name);
            let message = result.stderr.trim();
            self.banners.push(if message.is_empty() {
                format!("Failed to open {}", name)
            } else {
                message.to_owned()
            });
        }
    }

    fn cancel_pending(&mut self) {
        for pending in &self.pending {
            tracing::debug!(name = %pending.name, "cancelling reveal");
            pending.token.cancel();
        }
    }

    fn copy_detail(&mut self) {
        let detail = match &self.detail {
            Some(detail) => detail,
            None => return,
        };

        match clipboard::clip(clipboard::first_line(&detail.body)) {
            Ok(()) => self.status = String::from("Copied to clipboard"),
            Err(err) => self.banners.push(err.to_string()),
        }
    }

    fn activate(&mut self, executor: &Executor<Browser>) {
        let (label, is_dir) = match self.rows().into_iter().nth(self.selected) {
            Some(row) => row,
            None => return,
        };

        match self.view {
            View::All => self.reveal(executor, label),
            View::Folders if is_dir => {
                self.session.enter(&label);
                self.selected = 0;
            }
            View::Folders => {
                let name = self.session.entry_name(&label);
                self.reveal(executor, name);
            }
        }
    }

    /// Returns `false` when the browser should exit.
    fn handle_key(&mut self, executor: &Executor<Browser>, key: Key) -> bool {
        if self.searching {
            match key {
                Key::Esc | Key::Char('\n') => self.searching = false,
                Key::Backspace => {
                    let mut query = self.session.query().to_owned();
                    query.pop();
                    self.session.set_query(query);
                    self.selected = 0;
                }
                Key::Ctrl('u') => {
                    self.session.set_query("");
                    self.selected = 0;
                }
                Key::Char(c) => {
                    let query = format!("{}{}", self.session.query(), c);
                    self.session.set_query(query);
                    self.selected = 0;
                }
                _ => {}
            }
            return true;
        }

        match key {
            Key::Char('q') | Key::Esc => return false,
            Key::Char('/') => {
                self.view = View::All;
                self.searching = true;
            }
            Key::Char('\t') => {
                self.view = match self.view {
                    View::All => View::Folders,
                    View::Folders => View::All,
                };
                self.selected = 0;
            }
            Key::Up => self.selected = self.selected.saturating_sub(1),
            Key::Down => self.selected += 1,
            Key::Char('\n') | Key::Right => self.activate(executor),
            Key::Left | Key::Backspace if self.view == View::Folders => {
                self.session.up();
                self.selected = 0;
            }
            Key::Home if self.view == View::Folders => {
                self.session.nav_to(0);
                self.selected = 0;
            }
            Key::Char('c') => self.copy_detail(),
            Key::Char('r') => self.refresh(),
            Key::Char('x') => self.cancel_pending(),
            Key::Char('d') => self.banners.clear(),
            _ => {}
        }

        true
    }
}

/// Runs the interactive browser until the user quits.
pub fn run(session: Session) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    let mut main_loop = MainLoop::<Browser>::new();
    let executor = Executor::new(runtime.handle().clone(), main_loop.dispatcher());

    let mut app = Browser::new(session);
    app.refresh();

    // `terminal` gets dropped at the end of the scope, allowing stdout to work
    // as expected
    {
        let stdout = io::stdout().into_raw_mode()?;
        let stdout = MouseTerminal::from(stdout);
        let stdout = AlternateScreen::from(stdout);
        let backend = TermionBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        let events = Events::new();
        terminal.hide_cursor()?;

        loop {
            main_loop.dispatch_pending(&mut app);
            app.clamp_selection();
            draw(&mut terminal, &app)?;

            match events.next()? {
                Event::Input(key) => {
                    if !app.handle_key(&executor, key) {
                        break;
                    }
                }
                Event::Tick => {}
            }
        }
        terminal.show_cursor()?;
    }

    app.cancel_pending();
    // Completions of cancelled reveals may still be queued; nobody reads them.
    drop(runtime);

    Ok(())
}

fn draw<B>(terminal: &mut Terminal<B>, app: &Browser) -> io::Result<()>
where
    B: tui::backend::Backend,
{
    let rows = app.rows();
    let tab = |view: View, label: &'static str| {
        if app.view == view {
            Text::styled(
                label,
                Style::default().fg(Color::Yellow).modifier(Modifier::BOLD),
            )
        } else {
            Text::raw(label)
        }
    };
    let mut header = vec![tab(View::All, " All "), Text::raw("|"), tab(View::Folders, " Folders ")];
    header.push(Text::raw(format!(
        "   Search: {}{}",
        app.session.query(),
        if app.searching { "_" } else { "" }
    )));

    let list_title = match app.view {
        View::All => format!("Entries ({})", rows.len()),
        View::Folders => app.breadcrumb(),
    };
    let banner = app.banners.last().cloned().unwrap_or_default();
    let banner_height = if app.banners.is_empty() { 0 } else { 3 };
    let (detail_title, detail_body) = match &app.detail {
        Some(detail) => (detail.name.clone(), detail.body.clone()),
        None => (String::from("Details"), String::new()),
    };
    let status = if app.status.is_empty() {
        HELP.to_owned()
    } else {
        format!("{}  |  {}", app.status, HELP)
    };

    terminal.draw(|mut f| {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints(
                [
                    Constraint::Length(3),
                    Constraint::Length(banner_height),
                    Constraint::Min(5),
                    Constraint::Percentage(30),
                    Constraint::Length(3),
                ]
                .as_ref(),
            )
            .split(f.size());

        f.render_widget(
            Paragraph::new(header.iter()).block(
                Block::default()
                    .title("passview")
                    .title_style(Style::default().fg(Color::Red))
                    .borders(Borders::ALL),
            ),
            chunks[0],
        );

        if banner_height > 0 {
            let text = [Text::styled(banner.as_str(), Style::default().fg(Color::Red))];
            f.render_widget(
                Paragraph::new(text.iter())
                    .block(Block::default().borders(Borders::ALL))
                    .wrap(true),
                chunks[1],
            );
        }

        let items = rows.iter().map(|(label, is_dir)| {
            if *is_dir {
                Text::styled(format!("{}/", label), Style::default().fg(Color::Blue))
            } else {
                Text::raw(label.as_str())
            }
        });
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(&list_title))
            .highlight_style(Style::default().fg(Color::Yellow).modifier(Modifier::BOLD))
            .highlight_symbol("> ");
        let mut state = ListState::default();
        if !rows.is_empty() {
            state.select(Some(app.selected));
        }
        f.render_stateful_widget(list, chunks[2], &mut state);

        let body = [Text::raw(detail_body.as_str())];
        f.render_widget(
            Paragraph::new(body.iter())
                .block(Block::default().borders(Borders::ALL).title(&detail_title))
                .wrap(true),
            chunks[3],
        );

        let footer = [Text::raw(status.as_str())];
        f.render_widget(
            Paragraph::new(footer.iter())
                .block(Block::default().borders(Borders::ALL))
                .wrap(true),
            chunks[4],
        );
    })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::*;
    use crate::command::HostEnv;
    use crate::config::{Backend, BackendConfig};

    fn browser(store: PathBuf) -> Browser {
        let config = BackendConfig {
            backend: Backend::Host,
            custom_cmd: String::from("pass"),
            store_path: store,
            software_fallback: false,
        };
        let host = HostEnv {
            uid: 1000,
            gid: 1000,
            gnupg_dir: None,
        };
        let mut browser = Browser::new(Session::new(config, host));
        browser.refresh();
        browser
    }

    #[test]
    fn folders_view_lists_directories_first() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("email")).unwrap();
        fs::write(dir.path().join("email/gmail.gpg"), b"").unwrap();
        fs::write(dir.path().join("bank.gpg"), b"").unwrap();

        let mut browser = browser(dir.path().to_path_buf());
        browser.view = View::Folders;

        assert_eq!(
            browser.rows(),
            [(String::from("email"), true), (String::from("bank"), false)]
        );
        assert_eq!(browser.breadcrumb(), "Password Store");
    }

    #[test]
    fn colliding_entries_raise_a_banner() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Bank.gpg"), b"").unwrap();
        fs::write(dir.path().join("bank.gpg"), b"").unwrap();

        let browser = browser(dir.path().to_path_buf());

        assert!(browser.rows().is_empty());
        assert_eq!(browser.status, "Store could not be loaded");
        let banner = &browser.banners[0];
        assert!(banner.contains("Bank.gpg"), "{}", banner);
        assert!(banner.contains("bank.gpg"), "{}", banner);
    }

    #[test]
    fn failed_reveal_raises_a_banner() {
        let dir = tempfile::tempdir().unwrap();
        let mut browser = browser(dir.path().to_path_buf());
        browser.banners.clear();
        browser.pending.push(Pending {
            id: 7,
            name: String::from("bank"),
            token: CancellationToken::new(),
        });

        browser.on_revealed(
            7,
            String::from("bank"),
            ProcessResult {
                exit_code: 2,
                stdout: String::new(),
                stderr: String::from("gpg: decryption failed\n"),
            },
        );

        assert!(browser.pending.is_empty());
        assert_eq!(browser.banners, ["gpg: decryption failed"]);
        assert_eq!(browser.status, "Error opening bank");
        assert!(browser.detail.is_none());
    }
}
