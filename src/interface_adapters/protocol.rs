//! Wire codec for the line-framed peer protocol.
//!
//! Each message is one line of ASCII, space-delimited tokens, first token the
//! integer tag. Message boundaries come from the transport's line framing; no
//! length prefix. The one payload outside this taxonomy is the handshake: the
//! first line a connecting peer receives is its bare slot id.

use crate::domain::asteroid::{Asteroid, Size};
use crate::domain::tuning::AsteroidTuning;

const TAG_GAME: u8 = 0;
const TAG_LEVEL: u8 = 1;
const TAG_ASTEROIDS: u8 = 2;
const TAG_PLAYER_CONN: u8 = 3;
const TAG_SCORE_LIVES: u8 = 4;
const TAG_SHIP: u8 = 5;
const TAG_BULLET_FIRE: u8 = 6;
const TAG_BULLET_DESTROY: u8 = 7;

/// One asteroid record inside an `Asteroids` resync.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AsteroidRecord {
    pub x: f32,
    pub y: f32,
    pub heading: i32,
    pub speed: i32,
    pub size: Size,
}

impl AsteroidRecord {
    pub fn from_asteroid(asteroid: &Asteroid) -> Self {
        Self {
            x: asteroid.body.x,
            y: asteroid.body.y,
            heading: asteroid.body.heading,
            speed: asteroid.speed,
            size: asteroid.size,
        }
    }

    pub fn into_asteroid(self, tuning: &AsteroidTuning) -> Asteroid {
        Asteroid::new(self.x, self.y, self.heading, self.speed, self.size, tuning)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Global start/pause state. Host only.
    Game { started: bool, paused: bool },
    /// Level transition, or -1 for game over. Host only.
    Level { level: i32 },
    /// Full asteroid roster resync. Host only.
    Asteroids { asteroids: Vec<AsteroidRecord> },
    /// Slot occupancy change. Host only.
    PlayerConn { slot: usize, connected: bool },
    /// Authoritative score and life counts. Host only.
    ScoreLives { slot: usize, score: i32, lives: i32 },
    /// Kinematic ship update. Clients send only their own slot.
    Ship {
        slot: usize,
        x: f32,
        y: f32,
        heading: i32,
        thrust: bool,
        vel_x: f32,
        vel_y: f32,
        rotation_rate: i32,
        destroyed: bool,
    },
    /// New bullet announcement.
    BulletFire { slot: usize, x: f32, y: f32, heading: i32 },
    /// Removal of one bullet, by index in its owner's pool. Host only.
    BulletDestroy { slot: usize, index: usize },
}

#[derive(Debug)]
pub enum DecodeError {
    Empty,
    UnknownTag(String),
    MissingField { tag: u8, index: usize },
    BadField { tag: u8, index: usize, token: String },
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Empty => write!(f, "empty message"),
            DecodeError::UnknownTag(token) => write!(f, "unknown message tag {token:?}"),
            DecodeError::MissingField { tag, index } => {
                write!(f, "message tag {tag} is missing field {index}")
            }
            DecodeError::BadField { tag, index, token } => {
                write!(f, "message tag {tag} field {index} is malformed: {token:?}")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

impl Message {
    /// True for messages only the host may send.
    pub fn host_only(&self) -> bool {
        !matches!(self, Message::Ship { .. } | Message::BulletFire { .. })
    }

    pub fn encode(&self) -> String {
        match self {
            Message::Game { started, paused } => {
                format!("{TAG_GAME} {started} {paused}")
            }
            Message::Level { level } => format!("{TAG_LEVEL} {level}"),
            Message::Asteroids { asteroids } => {
                let mut line = TAG_ASTEROIDS.to_string();
                for record in asteroids {
                    line.push_str(&format!(
                        " {} {} {} {} {}",
                        record.x,
                        record.y,
                        record.heading,
                        record.speed,
                        size_token(record.size)
                    ));
                }
                line
            }
            Message::PlayerConn { slot, connected } => {
                format!("{TAG_PLAYER_CONN} {slot} {connected}")
            }
            Message::ScoreLives { slot, score, lives } => {
                format!("{TAG_SCORE_LIVES} {slot} {score} {lives}")
            }
            Message::Ship {
                slot,
                x,
                y,
                heading,
                thrust,
                vel_x,
                vel_y,
                rotation_rate,
                destroyed,
            } => format!(
                "{TAG_SHIP} {slot} {x} {y} {heading} {thrust} {vel_x} {vel_y} {rotation_rate} {destroyed}"
            ),
            Message::BulletFire { slot, x, y, heading } => {
                format!("{TAG_BULLET_FIRE} {slot} {x} {y} {heading}")
            }
            Message::BulletDestroy { slot, index } => {
                format!("{TAG_BULLET_DESTROY} {slot} {index}")
            }
        }
    }

    pub fn decode(line: &str) -> Result<Message, DecodeError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let tag_token = *tokens.first().ok_or(DecodeError::Empty)?;
        let tag: u8 = tag_token
            .parse()
            .map_err(|_| DecodeError::UnknownTag(tag_token.to_string()))?;
        let fields = Fields { tag, tokens };
        match tag {
            TAG_GAME => Ok(Message::Game {
                started: fields.bool(1)?,
                paused: fields.bool(2)?,
            }),
            TAG_LEVEL => Ok(Message::Level {
                level: fields.parse(1)?,
            }),
            TAG_ASTEROIDS => {
                let mut asteroids = Vec::new();
                let mut index = 1;
                while index < fields.tokens.len() {
                    asteroids.push(AsteroidRecord {
                        x: fields.parse(index)?,
                        y: fields.parse(index + 1)?,
                        heading: fields.parse(index + 2)?,
                        speed: fields.parse(index + 3)?,
                        size: fields.size(index + 4)?,
                    });
                    index += 5;
                }
                Ok(Message::Asteroids { asteroids })
            }
            TAG_PLAYER_CONN => Ok(Message::PlayerConn {
                slot: fields.parse(1)?,
                connected: fields.bool(2)?,
            }),
            TAG_SCORE_LIVES => Ok(Message::ScoreLives {
                slot: fields.parse(1)?,
                score: fields.parse(2)?,
                lives: fields.parse(3)?,
            }),
            TAG_SHIP => Ok(Message::Ship {
                slot: fields.parse(1)?,
                x: fields.parse(2)?,
                y: fields.parse(3)?,
                heading: fields.parse(4)?,
                thrust: fields.bool(5)?,
                vel_x: fields.parse(6)?,
                vel_y: fields.parse(7)?,
                rotation_rate: fields.parse(8)?,
                destroyed: fields.bool(9)?,
            }),
            TAG_BULLET_FIRE => Ok(Message::BulletFire {
                slot: fields.parse(1)?,
                x: fields.parse(2)?,
                y: fields.parse(3)?,
                heading: fields.parse(4)?,
            }),
            TAG_BULLET_DESTROY => Ok(Message::BulletDestroy {
                slot: fields.parse(1)?,
                index: fields.parse(2)?,
            }),
            _ => Err(DecodeError::UnknownTag(tag_token.to_string())),
        }
    }
}

fn size_token(size: Size) -> &'static str {
    match size {
        Size::Large => "LARGE",
        Size::Medium => "MEDIUM",
        Size::Small => "SMALL",
    }
}

/// Token accessor carrying the tag for error reporting.
struct Fields<'a> {
    tag: u8,
    tokens: Vec<&'a str>,
}

impl Fields<'_> {
    fn token(&self, index: usize) -> Result<&str, DecodeError> {
        self.tokens
            .get(index)
            .copied()
            .ok_or(DecodeError::MissingField {
                tag: self.tag,
                index,
            })
    }

    fn parse<T: std::str::FromStr>(&self, index: usize) -> Result<T, DecodeError> {
        let token = self.token(index)?;
        token.parse().map_err(|_| DecodeError::BadField {
            tag: self.tag,
            index,
            token: token.to_string(),
        })
    }

    fn bool(&self, index: usize) -> Result<bool, DecodeError> {
        match self.token(index)? {
            "true" => Ok(true),
            "false" => Ok(false),
            token => Err(DecodeError::BadField {
                tag: self.tag,
                index,
                token: token.to_string(),
            }),
        }
    }

    fn size(&self, index: usize) -> Result<Size, DecodeError> {
        match self.token(index)? {
            "LARGE" => Ok(Size::Large),
            "MEDIUM" => Ok(Size::Medium),
            "SMALL" => Ok(Size::Small),
            token => Err(DecodeError::BadField {
                tag: self.tag,
                index,
                token: token.to_string(),
            }),
        }
    }
}
