use std::io::{self, StdoutLock};
use std::time::Duration;

use clap::Parser;

use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers,
};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Terminal;
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use crate::{ask, AskError, Persona, RemoteServiceError, Settings};

const SELECTOR_TITLE: &str = "AIの専門家モードを選んでください";
const INPUT_TITLE: &str = "質問・相談をここに入力";
const INPUT_PLACEHOLDER: &str = "例）生成AIのRAGって何ですか？小学生にもわかる説明で。";
const EMPTY_INPUT_WARNING: &str = "テキストを入力してください。";
const ANSWER_TITLE: &str = "回答";
const THINKING_TITLE: &str = "AIが考え中...";

#[derive(Parser, Clone)]
#[command(name = "senpai", author, version, about, long_about = None)]
pub struct SenpaiArgs {
    #[arg(long, value_enum)]
    persona: Option<ArgPersona>,
}

#[derive(clap::ValueEnum, Clone, Copy)]
enum ArgPersona {
    KokugoSensei,
    ItEngineer,
}

impl From<ArgPersona> for Persona {
    fn from(value: ArgPersona) -> Self {
        match value {
            ArgPersona::KokugoSensei => Self::KokugoSensei,
            ArgPersona::ItEngineer => Self::ItEngineer,
        }
    }
}

#[allow(clippy::missing_errors_doc)]
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Startup order matters: .env first, then the environment snapshot, then
    // the flags. A missing .env file is not an error.
    dotenvy::dotenv().ok();
    let settings = Settings::from_env();
    let args = SenpaiArgs::parse();
    let persona = args.persona.map_or(Persona::ALL[0], Persona::from);
    let mut ui = SenpaiUI::new(settings, persona)?;
    ui.run().await
}

enum RequestExit {
    Exit,
    Finished,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Spinner {
    Idle,
    Phase(u8),
}

impl Spinner {
    const GLYPHS: [char; 4] = ['-', '\\', '|', '/'];

    const fn advanced(self) -> Self {
        match self {
            Self::Idle => Self::Phase(0),
            Self::Phase(phase) => Self::Phase((phase + 1) % 4),
        }
    }

    fn glyph(self) -> Option<char> {
        match self {
            Self::Idle => None,
            Self::Phase(phase) => Some(Self::GLYPHS[usize::from(phase % 4)]),
        }
    }
}

#[derive(Clone, Copy)]
enum Controls {
    Idle,
    Processing,
}

const fn controls_text(state: Controls) -> &'static str {
    match state {
        Controls::Idle => "Enter: 送信 | Tab: モード切替 | <C-c>: 終了",
        // No cancel control: an issued request runs to completion.
        Controls::Processing => "<C-c>: 終了",
    }
}

#[derive(Clone)]
enum AnswerContent {
    Empty,
    Answer(String),
    Warning(&'static str),
    Failure(String),
}

struct AnswerWindow<'t> {
    content: AnswerContent,
    paragraph: Paragraph<'t>,
    fidget: Spinner,
}

impl AnswerWindow<'_> {
    fn update(&mut self, content: AnswerContent, fidget: Spinner) {
        self.paragraph = create_answer_paragraph(&content, fidget);
        self.content = content;
        self.fidget = fidget;
    }

    fn spin_fidget(&mut self) {
        self.fidget = self.fidget.advanced();
        self.update(self.content.clone(), self.fidget);
    }
}

fn format_remote_failure(err: &RemoteServiceError) -> String {
    format!("エラーが発生しました：{err}\n\nAPIキーの設定（.env）を確認してください。")
}

fn create_selector_paragraph<'t>(selected: Persona) -> Paragraph<'t> {
    let lines: Vec<Line> = Persona::ALL
        .into_iter()
        .map(|persona| {
            if persona == selected {
                Line::from(Span::styled(
                    format!("(●) {}", persona.label()),
                    Style::default().fg(Color::Cyan),
                ))
            } else {
                Line::from(format!("( ) {}", persona.label()))
            }
        })
        .collect();
    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(SELECTOR_TITLE))
        .alignment(Alignment::Left)
}

fn create_input_paragraph<'t>(text: String) -> Paragraph<'t> {
    let content = if text.is_empty() {
        Text::from(Span::styled(
            INPUT_PLACEHOLDER,
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Text::from(text)
    };
    Paragraph::new(content)
        .block(Block::default().borders(Borders::ALL).title(INPUT_TITLE))
        .alignment(Alignment::Left)
}

fn create_answer_paragraph<'t>(content: &AnswerContent, progress: Spinner) -> Paragraph<'t> {
    let title = match progress.glyph() {
        Some(glyph) => format!("{THINKING_TITLE} {glyph}"),
        None => match content {
            AnswerContent::Answer(_) => ANSWER_TITLE.to_string(),
            _ => String::new(),
        },
    };
    let (text, style) = match content {
        AnswerContent::Empty => (String::new(), Style::default()),
        AnswerContent::Answer(answer) => (answer.clone(), Style::default()),
        AnswerContent::Warning(warning) => {
            ((*warning).to_string(), Style::default().fg(Color::Yellow))
        }
        AnswerContent::Failure(message) => (message.clone(), Style::default().fg(Color::Red)),
    };
    Paragraph::new(text)
        .style(style)
        .block(Block::default().borders(Borders::ALL).title(title))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false })
}

fn create_controls_paragraph<'t>(state: Controls) -> Paragraph<'t> {
    Paragraph::new(controls_text(state))
        .block(Block::default().borders(Borders::TOP))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true })
}

fn create_layout() -> Layout {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(2),
        ])
}

pub struct SenpaiUI<'t> {
    settings: Settings,
    term: Terminal<CrosstermBackend<StdoutLock<'t>>>,
    selected: Persona,
    selector: Paragraph<'t>,
    input_text: Paragraph<'t>,
    input: Input,
    answer: AnswerWindow<'t>,
    controls: Paragraph<'t>,
}

impl<'t> SenpaiUI<'t> {
    /// Builds the widget set; separate from `new` so raw mode can be rolled
    /// back when terminal setup fails halfway.
    fn initialization(
        settings: Settings,
        persona: Persona,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let mut stdout = io::stdout().lock();
        crossterm::execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let term = Terminal::new(backend)?;

        let selector = create_selector_paragraph(persona);
        let input = Input::default();
        let input_text = create_input_paragraph(String::new());
        let answer = AnswerWindow {
            content: AnswerContent::Empty,
            paragraph: create_answer_paragraph(&AnswerContent::Empty, Spinner::Idle),
            fidget: Spinner::Idle,
        };
        let controls = create_controls_paragraph(Controls::Idle);

        Ok(SenpaiUI {
            settings,
            term,
            selected: persona,
            selector,
            input_text,
            input,
            answer,
            controls,
        })
    }

    fn new(settings: Settings, persona: Persona) -> Result<Self, Box<dyn std::error::Error>> {
        enable_raw_mode()?;
        match Self::initialization(settings, persona) {
            Ok(ui) => Ok(ui),
            Err(err) => {
                disable_raw_mode()?;
                Err(err)
            }
        }
    }

    async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let result = self.mainloop().await;

        // restore terminal mode
        disable_raw_mode()?;
        crossterm::execute!(
            self.term.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        self.term.show_cursor()?;

        result
    }

    async fn mainloop(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        loop {
            self.update_controls(Controls::Idle);
            self.draw()?;

            if let Event::Key(key) = crossterm::event::read()? {
                match key {
                    KeyEvent {
                        code: KeyCode::Char('c'),
                        modifiers: KeyModifiers::CONTROL,
                        ..
                    } => return Ok(()),
                    KeyEvent {
                        code: KeyCode::Tab | KeyCode::Up | KeyCode::Down,
                        ..
                    } => self.select_next_persona(),
                    KeyEvent {
                        code: KeyCode::Enter,
                        ..
                    } => {
                        if matches!(self.submit().await?, RequestExit::Exit) {
                            return Ok(());
                        }
                    }
                    _ => {
                        self.input.handle_event(&Event::Key(key));
                        self.input_text = create_input_paragraph(self.input.value().to_string());
                    }
                }
            }
        }
    }

    async fn submit(&mut self) -> Result<RequestExit, Box<dyn std::error::Error>> {
        if self.input.value().trim().is_empty() {
            // Rejected locally; the remote service is never contacted.
            self.answer
                .update(AnswerContent::Warning(EMPTY_INPUT_WARNING), Spinner::Idle);
            return Ok(RequestExit::Finished);
        }

        let request_task = tokio::spawn(ask(
            self.settings.clone(),
            self.selected,
            self.input.value().to_string(),
        ));

        // The surface blocks until the response arrives: keys other than
        // <C-c> are dropped and an issued request cannot be cancelled.
        loop {
            self.update_controls(Controls::Processing);
            self.draw()?;
            if crossterm::event::poll(Duration::from_millis(100))? {
                if let Event::Key(KeyEvent {
                    code: KeyCode::Char('c'),
                    modifiers: KeyModifiers::CONTROL,
                    ..
                }) = crossterm::event::read()?
                {
                    return Ok(RequestExit::Exit);
                }
            }
            if request_task.is_finished() {
                let content = match request_task.await? {
                    Ok(answer) => AnswerContent::Answer(answer),
                    Err(AskError::EmptyInput) => AnswerContent::Warning(EMPTY_INPUT_WARNING),
                    Err(AskError::Remote(err)) => {
                        AnswerContent::Failure(format_remote_failure(&err))
                    }
                };
                self.answer.update(content, Spinner::Idle);
                return Ok(RequestExit::Finished);
            }
            self.answer.spin_fidget();
        }
    }

    fn draw(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.term.draw(|f| {
            let layout = create_layout();
            let chunks = layout.split(f.size());
            f.render_widget(self.selector.clone(), chunks[0]);

            let width = chunks[1].width.max(3) - 3; // keep 2 for borders and 1 for cursor
            let scroll = self.input.visual_scroll(width as usize);
            f.render_widget(
                self.input_text
                    .clone()
                    .scroll((0, u16::try_from(scroll).unwrap_or_default())),
                chunks[1],
            );
            f.set_cursor(
                chunks[1].x
                    + u16::try_from(self.input.visual_cursor().max(scroll) - scroll)
                        .unwrap_or_default()
                    + 1,
                chunks[1].y + 1,
            );

            f.render_widget(self.answer.paragraph.clone(), chunks[2]);
            f.render_widget(self.controls.clone(), chunks[3]);
        })?;
        Ok(())
    }

    fn select_next_persona(&mut self) {
        self.selected = self.selected.toggled();
        self.selector = create_selector_paragraph(self.selected);
    }

    fn update_controls(&mut self, controls: Controls) {
        self.controls = create_controls_paragraph(controls);
    }
}
