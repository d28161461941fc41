//! Session state machine.
//!
//! `transition` is a pure function of (context, state, input). The
//! controller feeds it one input at a time from its queue and executes the
//! returned effects, so provider callbacks can never race each other.

use super::lifecycle::TeardownMode;
use super::retry::Disposition;
use super::types::{SessionState, StatusCause};
use crate::error::SpeechError;
use std::time::Duration;

/// Per-session facts the transitions depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    pub continuous: bool,
    pub persist_connection: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// A provider start (initial or retry) succeeded
    Started,
    /// Recognition restarted on the existing transport
    Resumed,
    PauseRequested,
    StopRequested,
    SpeechStarted,
    SpeechEnded,
    FinalReceived,
    NoMatch,
    /// Provider reported session-stopped or end-of-stream.
    /// `disposition` applies only when the stop is an anomaly.
    ProviderStopped { disposition: Disposition },
    Failed(Disposition),
    IdleTimeout,
    MaxDuration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Teardown(TeardownMode),
    ScheduleRetry { attempt: u32, delay: Duration, error: SpeechError },
    CancelRetry,
    ResetUtterance,
    ReportAnomaly,
    ReportError { error: SpeechError, fatal: bool },
    Status(StatusCause),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: SessionState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn stay(state: SessionState) -> Self {
        Self {
            next: state,
            effects: Vec::new(),
        }
    }

    fn to(next: SessionState, effects: Vec<Effect>) -> Self {
        Self { next, effects }
    }
}

fn hard_stop(cause: StatusCause) -> Transition {
    Transition::to(
        SessionState::Stopped,
        vec![
            Effect::CancelRetry,
            Effect::Teardown(TeardownMode::Hard),
            Effect::ResetUtterance,
            Effect::Status(cause),
        ],
    )
}

fn fail(disposition: Disposition, fatal_cause: StatusCause) -> Transition {
    match disposition {
        Disposition::Retry {
            attempt,
            delay,
            error,
        } => Transition::to(
            SessionState::Reconnecting,
            vec![
                // Broken transports are never reused
                Effect::Teardown(TeardownMode::Hard),
                Effect::ResetUtterance,
                Effect::ScheduleRetry {
                    attempt,
                    delay,
                    error,
                },
                Effect::Status(StatusCause::Reconnecting {
                    attempt,
                    delay_ms: delay.as_millis() as u64,
                }),
            ],
        ),
        Disposition::Fatal(error) => {
            let mut t = hard_stop(fatal_cause);
            t.effects.push(Effect::ReportError { error, fatal: true });
            t
        }
    }
}

pub fn transition(ctx: Context, state: SessionState, input: Input) -> Transition {
    use SessionState::*;

    match (state, input) {
        (Stopped, Input::StopRequested) => Transition::to(
            Stopped,
            vec![Effect::CancelRetry, Effect::Teardown(TeardownMode::Hard)],
        ),
        (_, Input::StopRequested) => hard_stop(StatusCause::Stopped),
        (Stopped, _) => Transition::stay(Stopped),

        (_, Input::MaxDuration) => hard_stop(StatusCause::MaxDuration),

        (_, Input::Started) => {
            Transition::to(Listening, vec![Effect::Status(StatusCause::Started)])
        }
        (Idle, Input::Resumed) => {
            Transition::to(Listening, vec![Effect::Status(StatusCause::Resumed)])
        }

        (Listening | Processing, Input::PauseRequested) => {
            let mode = if ctx.persist_connection {
                TeardownMode::Soft
            } else {
                TeardownMode::Hard
            };
            Transition::to(
                Idle,
                vec![
                    Effect::Teardown(mode),
                    Effect::ResetUtterance,
                    Effect::Status(StatusCause::Paused),
                ],
            )
        }
        (Reconnecting, Input::PauseRequested) => Transition::to(
            Idle,
            vec![
                Effect::CancelRetry,
                Effect::ResetUtterance,
                Effect::Status(StatusCause::Paused),
            ],
        ),

        (Listening, Input::SpeechEnded) => {
            Transition::to(Processing, vec![Effect::Status(StatusCause::SpeechEnded)])
        }
        (Processing, Input::SpeechStarted) => {
            Transition::to(Listening, vec![Effect::Status(StatusCause::SpeechStarted)])
        }

        (Listening | Processing, Input::FinalReceived) => {
            Transition::to(Listening, vec![Effect::ResetUtterance])
        }

        (Listening | Processing, Input::NoMatch) => {
            if ctx.continuous {
                // Silence in a continuous session is not an error
                Transition::to(state, vec![Effect::ResetUtterance])
            } else {
                let mut t = hard_stop(StatusCause::Stopped);
                t.effects.push(Effect::ReportError {
                    error: SpeechError::NoMatch,
                    fatal: false,
                });
                t
            }
        }

        (Listening | Processing, Input::ProviderStopped { disposition }) => {
            if ctx.continuous {
                let retrying = matches!(disposition, Disposition::Retry { .. });
                let mut t = fail(disposition, StatusCause::Anomaly);
                t.effects.insert(0, Effect::ReportAnomaly);
                if retrying {
                    // The fatal path already closes with an anomaly status
                    t.effects.insert(1, Effect::Status(StatusCause::Anomaly));
                }
                t
            } else {
                // Single-shot sessions end on their own
                hard_stop(StatusCause::Stopped)
            }
        }

        (_, Input::Failed(disposition)) => fail(disposition, StatusCause::Stopped),

        (Listening | Processing, Input::IdleTimeout) if ctx.persist_connection => Transition::to(
            Idle,
            vec![
                Effect::Teardown(TeardownMode::Soft),
                Effect::ResetUtterance,
                Effect::Status(StatusCause::IdleTimeout),
            ],
        ),

        (state, _) => Transition::stay(state),
    }
}
