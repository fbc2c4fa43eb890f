//! Replay scripts: one interaction command per line.
//!
//! ```text
//! # draw an L
//! tool line
//! click 400 300
//! click 500 300
//! wait 2.5
//! ```
//!
//! Coordinates are screen pixels. Time only moves on `wait`, so a replay is
//! deterministic.

use anyhow::{Context, Result, anyhow, bail};
use kurbo::Point;
use snapdraft_core::{
    AciColor, Canvas, Duration, Instant, Key, KeyEvent, MouseButton, PointerEvent, ToolKind,
};

/// A single script command.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptCommand {
    Tool(ToolKind),
    /// Move the pointer without pressing a button.
    Move(Point),
    /// Move, press and release the left button.
    Click(Point),
    /// Press at the first point, move to the second and release there.
    Drag(Point, Point),
    /// `true` for press, `false` for release.
    Shift(bool),
    Key(Key),
    /// Press each character in turn.
    Type(String),
    Wait(Duration),
    /// Zoom about the viewport centre.
    Zoom(f64),
    Color(AciColor),
    /// Fit the view to the drawing.
    Fit,
}

fn number(token: Option<&str>, what: &str) -> Result<f64> {
    let token = token.ok_or_else(|| anyhow!("missing {}", what))?;
    let value: f64 = token
        .parse()
        .with_context(|| format!("invalid {} {:?}", what, token))?;
    if !value.is_finite() {
        bail!("{} must be finite", what);
    }
    Ok(value)
}

fn point<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Result<Point> {
    let x = number(tokens.next(), "x coordinate")?;
    let y = number(tokens.next(), "y coordinate")?;
    Ok(Point::new(x, y))
}

fn word<'a>(tokens: &mut impl Iterator<Item = &'a str>, what: &str) -> Result<&'a str> {
    tokens.next().ok_or_else(|| anyhow!("missing {}", what))
}

/// Parse one line. Blank lines and comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<ScriptCommand>> {
    let line = match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    };
    let mut tokens = line.split_whitespace();
    let Some(name) = tokens.next() else {
        return Ok(None);
    };

    let command = match name.to_ascii_lowercase().as_str() {
        "tool" => {
            let tool = word(&mut tokens, "tool name")?;
            ScriptCommand::Tool(ToolKind::parse(tool).ok_or_else(|| anyhow!("unknown tool {:?}", tool))?)
        }
        "move" => ScriptCommand::Move(point(&mut tokens)?),
        "click" => ScriptCommand::Click(point(&mut tokens)?),
        "drag" => {
            let from = point(&mut tokens)?;
            let to = point(&mut tokens)?;
            ScriptCommand::Drag(from, to)
        }
        "shift" => match word(&mut tokens, "shift state")? {
            "down" => ScriptCommand::Shift(true),
            "up" => ScriptCommand::Shift(false),
            other => bail!("expected `down` or `up`, got {:?}", other),
        },
        "key" => {
            let key = word(&mut tokens, "key name")?;
            ScriptCommand::Key(Key::parse(key).ok_or_else(|| anyhow!("unknown key {:?}", key))?)
        }
        "type" => ScriptCommand::Type(word(&mut tokens, "text")?.to_string()),
        "wait" => {
            let seconds = number(tokens.next(), "duration")?;
            let duration = Duration::try_from_secs_f64(seconds)
                .map_err(|_| anyhow!("invalid duration {}", seconds))?;
            ScriptCommand::Wait(duration)
        }
        "zoom" => {
            let factor = number(tokens.next(), "zoom factor")?;
            if factor <= 0.0 {
                bail!("zoom factor must be positive");
            }
            ScriptCommand::Zoom(factor)
        }
        "color" | "colour" => {
            let name = word(&mut tokens, "colour name")?;
            ScriptCommand::Color(
                AciColor::from_name(name).ok_or_else(|| anyhow!("unknown colour {:?}", name))?,
            )
        }
        "fit" => ScriptCommand::Fit,
        other => bail!("unknown command {:?}", other),
    };

    if let Some(extra) = tokens.next() {
        bail!("unexpected argument {:?}", extra);
    }
    Ok(Some(command))
}

/// Parse a whole script, reporting the first bad line.
pub fn parse_script(text: &str) -> Result<Vec<ScriptCommand>> {
    let mut commands = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let parsed = parse_line(line).with_context(|| format!("line {}: {}", idx + 1, line.trim()))?;
        commands.extend(parsed);
    }
    Ok(commands)
}

/// A canvas driven by a simulated clock.
pub struct Session {
    pub canvas: Canvas,
    now: Instant,
}

impl Session {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            now: Instant::now(),
        }
    }

    /// Current simulated time.
    pub fn now(&self) -> Instant {
        self.now
    }

    pub fn run(&mut self, commands: &[ScriptCommand]) {
        for command in commands {
            self.apply(command);
        }
    }

    fn pointer(&mut self, event: PointerEvent) {
        self.canvas.handle_pointer_event(event, self.now);
    }

    fn key(&mut self, event: KeyEvent) {
        self.canvas.handle_key_event(event, self.now);
    }

    pub fn apply(&mut self, command: &ScriptCommand) {
        log::debug!("Replaying {:?}", command);
        let left = MouseButton::Left;
        match command {
            ScriptCommand::Tool(tool) => self.canvas.set_tool(*tool),
            ScriptCommand::Move(position) => self.pointer(PointerEvent::Move { position: *position }),
            ScriptCommand::Click(position) => {
                let position = *position;
                self.pointer(PointerEvent::Move { position });
                self.pointer(PointerEvent::Down { position, button: left });
                self.pointer(PointerEvent::Up { position, button: left });
            }
            ScriptCommand::Drag(from, to) => {
                self.pointer(PointerEvent::Move { position: *from });
                self.pointer(PointerEvent::Down { position: *from, button: left });
                self.pointer(PointerEvent::Move { position: *to });
                self.pointer(PointerEvent::Up { position: *to, button: left });
            }
            ScriptCommand::Shift(true) => self.key(KeyEvent::Pressed(Key::Shift)),
            ScriptCommand::Shift(false) => self.key(KeyEvent::Released(Key::Shift)),
            ScriptCommand::Key(key) => self.key(KeyEvent::Pressed(*key)),
            ScriptCommand::Type(text) => {
                for c in text.chars() {
                    self.key(KeyEvent::Pressed(Key::Char(c)));
                }
            }
            ScriptCommand::Wait(duration) => self.now += *duration,
            ScriptCommand::Zoom(factor) => {
                let size = self.canvas.viewport_size;
                let center = Point::new(size.width / 2.0, size.height / 2.0);
                self.canvas.camera.zoom_at(center, *factor);
            }
            ScriptCommand::Color(color) => self.canvas.set_color(color.color()),
            ScriptCommand::Fit => self.canvas.zoom_all(),
        }
        self.canvas.tick(self.now);
    }
}
