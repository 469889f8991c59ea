use crate::error::ErrorKind;
use crate::model::mode::{GameMode, MultiplierState};
use crate::model::player::{PlayerPosition, Team};
use core::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of consecutive quiet actions (Accept or Pass) that closes bidding.
pub const SETTLING_STREAK: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NegotiationAction {
    Announce(GameMode),
    Accept,
    Double,
    Redouble,
    Pass,
}

impl NegotiationAction {
    /// Whether the action resets the settling streak.
    pub const fn is_escalation(self) -> bool {
        matches!(
            self,
            NegotiationAction::Announce(_) | NegotiationAction::Double | NegotiationAction::Redouble
        )
    }
}

impl fmt::Display for NegotiationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NegotiationAction::Announce(mode) => write!(f, "Announce({mode})"),
            NegotiationAction::Accept => f.write_str("Accept"),
            NegotiationAction::Double => f.write_str("Double"),
            NegotiationAction::Redouble => f.write_str("Redouble"),
            NegotiationAction::Pass => f.write_str("Pass"),
        }
    }
}

/// What happens when nobody bids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedealRule {
    /// That many consecutive passes with no bid abandon the deal.
    AfterPasses(u8),
    /// Passing is refused until somebody has announced.
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NegotiationRules {
    pub redeal: RedealRule,
}

impl Default for NegotiationRules {
    fn default() -> Self {
        Self {
            redeal: RedealRule::AfterPasses(4),
        }
    }
}

/// The frozen result of a settled negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub mode: GameMode,
    pub multiplier: MultiplierState,
    pub announcer: PlayerPosition,
}

impl Contract {
    pub const fn announcer_team(&self) -> Team {
        self.announcer.team()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NegotiationPhase {
    AwaitingBid,
    Contested,
    Settled(Contract),
    NoContract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NegotiationOutcome {
    Continuing { next: PlayerPosition },
    Settled(Contract),
    NoContract,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NegotiationError {
    #[error("negotiation is already over")]
    Finished,
    #[error("it is {expected}'s turn to bid, not {actual}'s")]
    OutOfTurn {
        expected: PlayerPosition,
        actual: PlayerPosition,
    },
    #[error("{attempted} does not outbid {current}")]
    BidNotHigher {
        attempted: GameMode,
        current: GameMode,
    },
    #[error("{0} has already announced a colour")]
    ColourAlreadyAnnounced(Team),
    #[error("no announcement is allowed once the contract is doubled")]
    AnnounceAfterDouble,
    #[error("{0} already let a bid stand and cannot announce")]
    AnnounceAfterYielding(PlayerPosition),
    #[error("there is no bid to respond to")]
    NoBid,
    #[error("only the opposing team may {0} the current bid")]
    NotOpponent(&'static str),
    #[error("only the announcing team may redouble")]
    NotAnnouncerTeam,
    #[error("the contract is already {0}")]
    AlreadyEscalated(MultiplierState),
    #[error("the contract has not been doubled")]
    NotDoubled,
    #[error("{0} cannot be redoubled")]
    RedoubleNotAllowed(GameMode),
    #[error("the opening bidder may not pass")]
    PassNotAllowed,
}

impl NegotiationError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::IllegalAction
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Bid {
    mode: GameMode,
    seat: PlayerPosition,
}

/// Bidding for one deal. Actions are consumed strictly in seat order starting
/// at the dealer's left; `apply` validates first and only mutates on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiationState {
    rules: NegotiationRules,
    dealer: PlayerPosition,
    to_act: PlayerPosition,
    bid: Option<Bid>,
    multiplier: MultiplierState,
    history: Vec<(PlayerPosition, NegotiationAction)>,
    quiet_streak: u8,
    colour_announced: [bool; 2],
    yielded: [bool; 4],
    phase: NegotiationPhase,
}

impl NegotiationState {
    pub fn new(dealer: PlayerPosition, rules: NegotiationRules) -> Self {
        Self {
            rules,
            dealer,
            to_act: dealer.next(),
            bid: None,
            multiplier: MultiplierState::Normal,
            history: Vec::new(),
            quiet_streak: 0,
            colour_announced: [false; 2],
            yielded: [false; 4],
            phase: NegotiationPhase::AwaitingBid,
        }
    }

    pub fn dealer(&self) -> PlayerPosition {
        self.dealer
    }

    pub fn current_player(&self) -> PlayerPosition {
        self.to_act
    }

    pub fn current_bid(&self) -> Option<(GameMode, PlayerPosition)> {
        self.bid.map(|bid| (bid.mode, bid.seat))
    }

    pub fn multiplier(&self) -> MultiplierState {
        self.multiplier
    }

    pub fn phase(&self) -> NegotiationPhase {
        self.phase
    }

    pub fn history(&self) -> &[(PlayerPosition, NegotiationAction)] {
        &self.history
    }

    pub fn is_complete(&self) -> bool {
        matches!(
            self.phase,
            NegotiationPhase::Settled(_) | NegotiationPhase::NoContract
        )
    }

    pub fn contract(&self) -> Option<Contract> {
        match self.phase {
            NegotiationPhase::Settled(contract) => Some(contract),
            _ => None,
        }
    }

    pub fn validate(
        &self,
        seat: PlayerPosition,
        action: NegotiationAction,
    ) -> Result<(), NegotiationError> {
        if self.is_complete() {
            return Err(NegotiationError::Finished);
        }
        if seat != self.to_act {
            return Err(NegotiationError::OutOfTurn {
                expected: self.to_act,
                actual: seat,
            });
        }

        match action {
            NegotiationAction::Announce(mode) => self.check_announce(seat, mode),
            NegotiationAction::Accept => {
                self.opposing_bid(seat, "accept")?;
                Ok(())
            }
            NegotiationAction::Double => {
                self.opposing_bid(seat, "double")?;
                if self.multiplier != MultiplierState::Normal {
                    return Err(NegotiationError::AlreadyEscalated(self.multiplier));
                }
                Ok(())
            }
            NegotiationAction::Redouble => {
                let bid = self.bid.ok_or(NegotiationError::NoBid)?;
                if bid.seat.team() != seat.team() {
                    return Err(NegotiationError::NotAnnouncerTeam);
                }
                if !bid.mode.can_redouble() {
                    return Err(NegotiationError::RedoubleNotAllowed(bid.mode));
                }
                match self.multiplier {
                    MultiplierState::Doubled => Ok(()),
                    MultiplierState::Normal => Err(NegotiationError::NotDoubled),
                    MultiplierState::Redoubled => {
                        Err(NegotiationError::AlreadyEscalated(self.multiplier))
                    }
                }
            }
            NegotiationAction::Pass => {
                if self.bid.is_none() && self.rules.redeal == RedealRule::Never {
                    return Err(NegotiationError::PassNotAllowed);
                }
                Ok(())
            }
        }
    }

    pub fn apply(
        &mut self,
        seat: PlayerPosition,
        action: NegotiationAction,
    ) -> Result<NegotiationOutcome, NegotiationError> {
        self.validate(seat, action)?;

        match action {
            NegotiationAction::Announce(mode) => {
                if mode.is_colour() {
                    self.colour_announced[seat.team().index()] = true;
                }
                self.bid = Some(Bid { mode, seat });
                self.multiplier = MultiplierState::Normal;
            }
            NegotiationAction::Accept => {
                self.yielded[seat.index()] = true;
                if let Some(bid) = self.bid {
                    if bid.mode.accept_auto_doubles() && self.multiplier == MultiplierState::Normal
                    {
                        self.multiplier = MultiplierState::Doubled;
                    }
                }
            }
            NegotiationAction::Double => self.multiplier = MultiplierState::Doubled,
            NegotiationAction::Redouble => self.multiplier = MultiplierState::Redoubled,
            NegotiationAction::Pass => {
                if self.bid.is_some() {
                    self.yielded[seat.index()] = true;
                }
            }
        }

        self.history.push((seat, action));
        if action.is_escalation() {
            self.quiet_streak = 0;
        } else {
            self.quiet_streak = self.quiet_streak.saturating_add(1);
        }

        self.phase = self.next_phase();
        Ok(match self.phase {
            NegotiationPhase::Settled(contract) => NegotiationOutcome::Settled(contract),
            NegotiationPhase::NoContract => NegotiationOutcome::NoContract,
            NegotiationPhase::AwaitingBid | NegotiationPhase::Contested => {
                self.to_act = self.to_act.next();
                NegotiationOutcome::Continuing { next: self.to_act }
            }
        })
    }

    /// Every action the seat to act may take right now, announcements first in
    /// bidding order.
    pub fn valid_actions(&self) -> Vec<NegotiationAction> {
        let seat = self.to_act;
        let mut candidates: Vec<NegotiationAction> = GameMode::ALL
            .iter()
            .copied()
            .map(NegotiationAction::Announce)
            .collect();
        candidates.extend([
            NegotiationAction::Accept,
            NegotiationAction::Double,
            NegotiationAction::Redouble,
            NegotiationAction::Pass,
        ]);
        candidates
            .into_iter()
            .filter(|action| self.validate(seat, *action).is_ok())
            .collect()
    }

    fn check_announce(&self, seat: PlayerPosition, mode: GameMode) -> Result<(), NegotiationError> {
        if self.multiplier != MultiplierState::Normal {
            return Err(NegotiationError::AnnounceAfterDouble);
        }
        if self.yielded[seat.index()] {
            return Err(NegotiationError::AnnounceAfterYielding(seat));
        }
        if let Some(bid) = self.bid {
            if !mode.is_higher_than(bid.mode) {
                return Err(NegotiationError::BidNotHigher {
                    attempted: mode,
                    current: bid.mode,
                });
            }
        }
        let team = seat.team();
        if mode.is_colour() && self.colour_announced[team.index()] {
            return Err(NegotiationError::ColourAlreadyAnnounced(team));
        }
        Ok(())
    }

    fn opposing_bid(
        &self,
        seat: PlayerPosition,
        verb: &'static str,
    ) -> Result<Bid, NegotiationError> {
        let bid = self.bid.ok_or(NegotiationError::NoBid)?;
        if bid.seat.team() == seat.team() {
            return Err(NegotiationError::NotOpponent(verb));
        }
        Ok(bid)
    }

    fn next_phase(&self) -> NegotiationPhase {
        match self.bid {
            Some(bid) if self.quiet_streak >= SETTLING_STREAK => {
                NegotiationPhase::Settled(Contract {
                    mode: bid.mode,
                    multiplier: self.multiplier,
                    announcer: bid.seat,
                })
            }
            Some(_) => NegotiationPhase::Contested,
            None => match self.rules.redeal {
                RedealRule::AfterPasses(limit) if self.quiet_streak >= limit.max(1) => {
                    NegotiationPhase::NoContract
                }
                _ => NegotiationPhase::AwaitingBid,
            },
        }
    }
}
