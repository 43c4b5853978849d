use std::io;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, Paragraph, Wrap};
use ratatui::{Frame, Terminal};

use obi_core::actions::{Action, Effect, RuntimeAction, UserAction};
use obi_core::domain::{MealType, Phase, TOTAL_STUDY_DAYS};
use obi_core::persistence::StateStore;
use obi_core::reducer::reduce;
use obi_core::state::{
    derive_dashboard, AppState, AssessmentAxis, AssessmentForm, LoginField, MealStep,
    MealTimerStep, MorningField, ProfileField, Screen, StimulationStep, SummaryField, SummaryForm,
    TimerPhase, UploadForm,
};
use obi_insight::InsightClient;

struct TuiGuard;

impl Drop for TuiGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
    }
}

pub fn run(
    state: AppState,
    store: StateStore,
    insight: InsightClient,
) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, crossterm::cursor::Hide)?;
    let _guard = TuiGuard; // Restores the terminal on exit or panic

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    run_app(&mut terminal, state, store, insight).map_err(|e| e.into())
}

/// One-second tick source for the stimulation countdown and meal
/// stopwatch. Armed and disarmed only through reducer effects; while
/// disarmed no tick can reach the state machine.
#[derive(Debug)]
struct Ticker {
    armed: bool,
    last: Instant,
}

impl Ticker {
    fn new() -> Self {
        Self {
            armed: false,
            last: Instant::now(),
        }
    }

    fn arm(&mut self) {
        self.armed = true;
        self.last = Instant::now();
    }

    fn disarm(&mut self) {
        self.armed = false;
    }

    fn due(&mut self) -> bool {
        if !self.armed {
            return false;
        }
        if self.last.elapsed() >= Duration::from_secs(1) {
            self.last += Duration::from_secs(1);
            return true;
        }
        false
    }
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    mut state: AppState,
    store: StateStore,
    insight: InsightClient,
) -> io::Result<()> {
    let (insight_tx, insight_rx) = mpsc::channel::<String>();
    let mut ticker = Ticker::new();
    let mut dirty = true;

    loop {
        if dirty {
            terminal.draw(|frame| draw(frame, &state))?;
            dirty = false;
        }

        while let Ok(text) = insight_rx.try_recv() {
            dirty |= dispatch(
                &mut state,
                Action::Runtime(RuntimeAction::InsightReady(text)),
                &mut ticker,
                &store,
                &insight,
                &insight_tx,
            );
        }

        if ticker.due() {
            dirty |= dispatch(
                &mut state,
                Action::Runtime(RuntimeAction::Tick),
                &mut ticker,
                &store,
                &insight,
                &insight_tx,
            );
            continue;
        }

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    && key.code == KeyCode::Char('c')
                {
                    return Ok(());
                }
                if matches!(state.screen, Screen::Dashboard) && key.code == KeyCode::Char('q') {
                    return Ok(());
                }
                if let Some(action) = map_key(&state, key) {
                    dirty |= dispatch(
                        &mut state,
                        Action::User(action),
                        &mut ticker,
                        &store,
                        &insight,
                        &insight_tx,
                    );
                }
            }
            Event::Resize(_, _) => dirty = true,
            _ => {}
        }
    }
}

/// Runs one reduction and interprets its effects. Returns whether a
/// redraw was requested.
fn dispatch(
    state: &mut AppState,
    action: Action,
    ticker: &mut Ticker,
    store: &StateStore,
    insight: &InsightClient,
    insight_tx: &mpsc::Sender<String>,
) -> bool {
    let mut dirty = false;
    for effect in reduce(state, action) {
        match effect {
            Effect::SaveState => {
                if let Err(err) = store.save(&state.study) {
                    log::error!("failed to persist study state: {err}");
                }
            }
            Effect::WipeState => {
                if let Err(err) = store.wipe() {
                    log::error!("failed to wipe study state: {err}");
                }
            }
            Effect::StartTicker => ticker.arm(),
            Effect::StopTicker => ticker.disarm(),
            Effect::RequestInsight { log, phase } => {
                let client = insight.clone();
                let tx = insight_tx.clone();
                thread::spawn(move || {
                    let text = client.generate_daily_insight(&log, phase);
                    let _ = tx.send(text);
                });
            }
            Effect::RequestFrame => dirty = true,
        }
    }
    dirty
}

fn map_key(state: &AppState, key: KeyEvent) -> Option<UserAction> {
    match &state.screen {
        Screen::Login(_) => match key.code {
            KeyCode::Enter => Some(UserAction::ConfirmLogin),
            KeyCode::Tab => Some(UserAction::LoginNextField),
            KeyCode::Backspace => Some(UserAction::LoginBackspace),
            KeyCode::Char(c) => Some(UserAction::LoginInput(c)),
            _ => None,
        },
        Screen::ProfileSetup(_) => match key.code {
            KeyCode::Enter => Some(UserAction::SubmitProfile),
            KeyCode::Tab => Some(UserAction::ProfileNextField),
            KeyCode::Left | KeyCode::Right => Some(UserAction::CycleGender),
            KeyCode::Backspace => Some(UserAction::ProfileBackspace),
            KeyCode::Char(c) => Some(UserAction::ProfileInput(c)),
            _ => None,
        },
        Screen::Dashboard => match key.code {
            KeyCode::Char('m') => Some(UserAction::OpenMorningMeasure),
            KeyCode::Char('b') => Some(UserAction::OpenMealTask(MealType::Breakfast)),
            KeyCode::Char('d') => Some(UserAction::OpenMealTask(MealType::Dinner)),
            KeyCode::Char('g') => Some(UserAction::OpenGlucoseUpload),
            KeyCode::Char('s') => Some(UserAction::OpenDailySummary),
            KeyCode::Char('x') => Some(UserAction::DismissInsight),
            KeyCode::Char('R') => Some(UserAction::ResetStudy),
            _ => None,
        },
        Screen::MorningMeasure(_) => match key.code {
            KeyCode::Esc => Some(UserAction::LeaveScreen),
            KeyCode::Enter => Some(UserAction::SubmitMorning),
            KeyCode::Tab | KeyCode::Down => Some(UserAction::MorningNextField),
            KeyCode::BackTab | KeyCode::Up => Some(UserAction::MorningPrevField),
            KeyCode::Backspace => Some(UserAction::MorningBackspace),
            KeyCode::Char(c) => Some(UserAction::MorningInput(c)),
            _ => None,
        },
        Screen::MealTask { flow, .. } => {
            if key.code == KeyCode::Esc {
                return Some(UserAction::LeaveScreen);
            }
            match &flow.step {
                MealStep::PreAssess(_) | MealStep::PostAssess(_) => match key.code {
                    KeyCode::Left => Some(UserAction::AssessmentAdjust(-5)),
                    KeyCode::Right => Some(UserAction::AssessmentAdjust(5)),
                    KeyCode::Tab | KeyCode::Down => Some(UserAction::AssessmentNextAxis),
                    KeyCode::Enter => Some(UserAction::SubmitAssessment),
                    _ => None,
                },
                MealStep::Stimulation(step) => match key.code {
                    KeyCode::Enter if step.timer == TimerPhase::Idle => {
                        Some(UserAction::StartStimulation)
                    }
                    KeyCode::Enter => Some(UserAction::FinishStimulation),
                    _ => None,
                },
                MealStep::MealTimer(timer) => match key.code {
                    KeyCode::Enter if !timer.running => Some(UserAction::StartMeal),
                    KeyCode::Enter => Some(UserAction::FinishMeal),
                    _ => None,
                },
            }
        }
        Screen::GlucoseUpload(form) => match key.code {
            KeyCode::Esc => Some(UserAction::LeaveScreen),
            KeyCode::Up | KeyCode::Down => Some(UserAction::ToggleUploadKind),
            KeyCode::Left | KeyCode::Right => Some(UserAction::ToggleUploadEvent),
            KeyCode::Backspace => Some(UserAction::UploadBackspace),
            KeyCode::Enter => {
                let file_name = form.file_input.trim().to_string();
                if file_name.is_empty() {
                    None
                } else {
                    Some(UserAction::FileProvided { file_name })
                }
            }
            KeyCode::Char(c) => Some(UserAction::UploadInput(c)),
            _ => None,
        },
        Screen::DailySummary(_) => match key.code {
            KeyCode::Esc => Some(UserAction::LeaveScreen),
            KeyCode::Left => Some(UserAction::SummaryAdjust(-5)),
            KeyCode::Right => Some(UserAction::SummaryAdjust(5)),
            KeyCode::Tab | KeyCode::Down => Some(UserAction::SummaryNextField),
            KeyCode::Char(' ') => Some(UserAction::ToggleDeviceConfirmed),
            KeyCode::Enter => Some(UserAction::SubmitDailySummary),
            _ => None,
        },
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn draw(frame: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_header(frame, state, chunks[0]);

    match &state.screen {
        Screen::Login(form) => draw_login(frame, form, chunks[1]),
        Screen::ProfileSetup(form) => draw_profile(frame, form, chunks[1]),
        Screen::Dashboard => draw_dashboard(frame, state, chunks[1]),
        Screen::MorningMeasure(form) => draw_morning(frame, form, chunks[1]),
        Screen::MealTask { flow, .. } => draw_meal_task(frame, flow, chunks[1]),
        Screen::GlucoseUpload(form) => draw_glucose(frame, state, form, chunks[1]),
        Screen::DailySummary(form) => draw_summary(frame, form, chunks[1]),
    }

    draw_footer(frame, state, chunks[2]);
}

fn draw_header(frame: &mut Frame, state: &AppState, area: Rect) {
    let mut spans = vec![Span::styled(
        state.screen.title(),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if state.study.is_authenticated && state.study.profile.is_some() {
        let view = derive_dashboard(&state.study, chrono::Utc::now());
        spans.push(Span::raw(format!(
            "  |  Day {} of {TOTAL_STUDY_DAYS}  |  {}",
            view.day,
            view.phase.label()
        )));
    }
    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("obi"));
    frame.render_widget(header, area);
}

fn focus_marker(focused: bool) -> Span<'static> {
    if focused {
        Span::styled("> ", Style::default().fg(Color::Cyan))
    } else {
        Span::raw("  ")
    }
}

fn field_line<'a>(label: &'a str, value: &'a str, focused: bool) -> Line<'a> {
    Line::from(vec![
        focus_marker(focused),
        Span::styled(format!("{label}: "), Style::default().fg(Color::Gray)),
        Span::raw(value),
        if focused { Span::raw("_") } else { Span::raw("") },
    ])
}

fn draw_login(frame: &mut Frame, form: &obi_core::state::LoginForm, area: Rect) {
    let lines = vec![
        Line::from("Obesity intervention study - data collection"),
        Line::from(""),
        field_line("Phone", &form.phone, form.focus == LoginField::Phone),
        field_line("One-time code", &form.code, form.focus == LoginField::Code),
        Line::from(""),
        Line::from(Span::styled(
            "Enter to sign in",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    frame.render_widget(widget, area);
}

fn draw_profile(frame: &mut Frame, form: &obi_core::state::ProfileForm, area: Rect) {
    let lines = vec![
        Line::from("Complete your profile to set up the study record."),
        Line::from(""),
        field_line("Name", &form.name, form.focus == ProfileField::Name),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("Gender: ", Style::default().fg(Color::Gray)),
            Span::raw(form.gender.label()),
            Span::styled("  (left/right to change)", Style::default().fg(Color::DarkGray)),
        ]),
        field_line("Age", &form.age, form.focus == ProfileField::Age),
        field_line("Height (cm)", &form.height, form.focus == ProfileField::Height),
        Line::from(""),
        Line::from(Span::styled(
            "Tab to move, Enter to submit",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let widget = Paragraph::new(lines).block(Block::default().borders(Borders::ALL));
    frame.render_widget(widget, area);
}

fn task_item(label: &str, key: char, done: bool) -> ListItem<'static> {
    let status = if done {
        Span::styled("[done]", Style::default().fg(Color::Green))
    } else {
        Span::styled("[    ]", Style::default().fg(Color::DarkGray))
    };
    ListItem::new(Line::from(vec![
        status,
        Span::raw(format!(" ({key}) {label}")),
    ]))
}

fn draw_dashboard(frame: &mut Frame, state: &AppState, area: Rect) {
    let view = derive_dashboard(&state.study, chrono::Utc::now());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(4)])
        .split(area);

    let items = vec![
        task_item("Morning measurement", 'm', view.morning_done),
        task_item("Breakfast task", 'b', view.breakfast_done),
        task_item("Dinner task", 'd', view.dinner_done),
        // Upload has no completion concept: always offered as available.
        task_item("Glucose data upload", 'g', false),
        task_item("Daily summary", 's', false),
    ];
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Today's tasks"),
    );
    frame.render_widget(list, chunks[0]);

    let banner = match &state.insight {
        Some(text) => Paragraph::new(Line::from(vec![
            Span::styled("Assistant: ", Style::default().fg(Color::Blue)),
            Span::raw(text.as_str()),
            Span::styled("  (x to dismiss)", Style::default().fg(Color::DarkGray)),
        ]))
        .wrap(Wrap { trim: true }),
        None => Paragraph::new(Span::styled(
            "Complete today's tasks, then submit the daily summary.",
            Style::default().fg(Color::DarkGray),
        )),
    };
    frame.render_widget(
        banner.block(Block::default().borders(Borders::ALL)),
        chunks[1],
    );
}

fn draw_morning(frame: &mut Frame, form: &obi_core::state::MorningForm, area: Rect) {
    let fields = [
        MorningField::Weight,
        MorningField::BodyFat,
        MorningField::MuscleMass,
        MorningField::VisceralFat,
        MorningField::Bmr,
        MorningField::Notes,
    ];
    let mut lines = vec![
        Line::from("Weight is required; everything else is optional."),
        Line::from(""),
    ];
    for field in fields {
        lines.push(field_line(
            field.label(),
            form.field(field),
            form.focus == Some(field),
        ));
    }
    let widget = Paragraph::new(lines).block(Block::default().borders(Borders::ALL));
    frame.render_widget(widget, area);
}

fn assessment_gauge(axis: AssessmentAxis, value: u8, focused: bool) -> Gauge<'static> {
    let style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::Blue)
    };
    Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(axis.label()),
        )
        .gauge_style(style)
        .percent(u16::from(value))
        .label(format!("{value}/100"))
}

fn draw_assessment(frame: &mut Frame, form: &AssessmentForm, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);
    let axes = [
        (AssessmentAxis::Hunger, form.values.hunger),
        (AssessmentAxis::Fullness, form.values.fullness),
        (AssessmentAxis::DesireToEat, form.values.desire_to_eat),
    ];
    for (i, (axis, value)) in axes.into_iter().enumerate() {
        frame.render_widget(assessment_gauge(axis, value, form.focus == axis), chunks[i]);
    }
}

fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

fn draw_stimulation(frame: &mut Frame, phase: Phase, step: &StimulationStep, area: Rect) {
    let instruction = match phase {
        Phase::Blank => {
            "Put on the electrodes and apply gel, then keep the device switched OFF."
        }
        Phase::Stimulation => {
            "Put on the electrodes and apply gel, then adjust the current until \
             clearly felt but not painful."
        }
    };
    let status = match step.timer {
        TimerPhase::Idle => "not started",
        TimerPhase::Running => "running",
        TimerPhase::Ended => "ended",
    };
    let control = match step.timer {
        TimerPhase::Idle => "Enter to start the 30-minute session",
        TimerPhase::Running => "Enter to end early",
        TimerPhase::Ended => "Enter to confirm completion",
    };
    let lines = vec![
        Line::from(instruction),
        Line::from(""),
        Line::from(format!(
            "Session: {status}  |  intensity level {}",
            step.intensity
        )),
        Line::from(Span::styled(
            format!("Remaining  {}", format_clock(step.remaining)),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(control, Style::default().fg(Color::DarkGray))),
    ];
    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    frame.render_widget(widget, area);
}

fn draw_meal_timer(frame: &mut Frame, timer: &MealTimerStep, area: Rect) {
    let prompt = if timer.running {
        "Eating in progress..."
    } else {
        "You can take the device off now. Press Enter when you start eating."
    };
    let control = if timer.running {
        "Enter to finish the meal"
    } else {
        "Enter to start eating"
    };
    let lines = vec![
        Line::from(prompt),
        Line::from(""),
        Line::from(Span::styled(
            format!("Elapsed  {}", format_clock(timer.elapsed)),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(control, Style::default().fg(Color::DarkGray))),
    ];
    let widget = Paragraph::new(lines).block(Block::default().borders(Borders::ALL));
    frame.render_widget(widget, area);
}

fn draw_meal_task(frame: &mut Frame, flow: &obi_core::state::MealFlow, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(5)])
        .split(area);
    frame.render_widget(
        Paragraph::new(Span::styled(
            flow.step.label(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        chunks[0],
    );
    match &flow.step {
        MealStep::PreAssess(form) | MealStep::PostAssess(form) => {
            draw_assessment(frame, form, chunks[1])
        }
        MealStep::Stimulation(step) => draw_stimulation(frame, flow.phase, step, chunks[1]),
        MealStep::MealTimer(timer) => draw_meal_timer(frame, timer, chunks[1]),
    }
}

fn draw_glucose(frame: &mut Frame, state: &AppState, form: &UploadForm, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(3)])
        .split(area);

    let lines = vec![
        Line::from(vec![
            Span::styled("Data type: ", Style::default().fg(Color::Gray)),
            Span::raw(form.kind.label()),
            Span::styled("   Context: ", Style::default().fg(Color::Gray)),
            Span::raw(form.event.label()),
            Span::styled(
                "   (up/down and left/right to change)",
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        field_line("File", &form.file_input, true),
        Line::from(Span::styled(
            "Type or drop a file name, Enter to record the upload",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL)),
        chunks[0],
    );

    let items: Vec<ListItem> = state
        .study
        .glucose_uploads
        .iter()
        .take(10)
        .map(|upload| {
            ListItem::new(Line::from(format!(
                "{}  {}  {}  {}",
                upload.upload_date.format("%Y-%m-%d %H:%M"),
                upload.kind.label(),
                upload.related_event.label(),
                upload.file_name
            )))
        })
        .collect();
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Upload history (newest first)"),
    );
    frame.render_widget(list, chunks[1]);
}

fn draw_summary(frame: &mut Frame, form: &SummaryForm, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Min(0),
        ])
        .split(area);

    let scores = [
        (
            "Breakfast appetite",
            form.appetite.breakfast_score,
            form.focus == SummaryField::BreakfastScore,
        ),
        (
            "Dinner appetite",
            form.appetite.dinner_score,
            form.focus == SummaryField::DinnerScore,
        ),
    ];
    for (i, (title, value, focused)) in scores.into_iter().enumerate() {
        let style = if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::Blue)
        };
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(title))
            .gauge_style(style)
            .percent(u16::from(value))
            .label(format!("{value}/100"));
        frame.render_widget(gauge, chunks[i]);
    }

    let check = if form.device_confirmed { "[x]" } else { "[ ]" };
    let device = Line::from(vec![
        focus_marker(form.focus == SummaryField::DeviceConfirmed),
        Span::raw(format!("{check} Device protocol completed today")),
        Span::styled("  (space to toggle)", Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(device), chunks[2]);
}

fn draw_footer(frame: &mut Frame, state: &AppState, area: Rect) {
    let hint = match &state.screen {
        Screen::Login(_) => "Tab switch field | Enter sign in | Ctrl-C quit",
        Screen::ProfileSetup(_) => "Tab next field | Enter submit | Ctrl-C quit",
        Screen::Dashboard => "m/b/d/g/s open task | R reset study | q quit",
        Screen::MorningMeasure(_) => "Tab next field | Enter submit | Esc back",
        Screen::MealTask { .. } => "Enter advance | Esc abandon task",
        Screen::GlucoseUpload(_) => "Enter record upload | Esc back",
        Screen::DailySummary(_) => "Left/Right adjust | Enter save day | Esc back",
    };
    frame.render_widget(
        Paragraph::new(Span::styled(hint, Style::default().fg(Color::DarkGray))),
        area,
    );
}
