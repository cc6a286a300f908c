// crates/courtside-core/src/lib.rs
// ============================================================================
// Module: Courtside Core Root
// Description: Public API surface for the core domain model.
// Purpose: Re-export the types the rest of the workspace consumes.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Core is the dependency root of the workspace: value types, the governance
//! event taxonomy, rule sets, and the interface seams for storage and text
//! generation. It performs no I/O and never reads a clock.

// ============================================================================
// SECTION: Core Modules
// ============================================================================

pub mod core;
pub mod interfaces;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::effects::Action;
pub use core::effects::ArgValue;
pub use core::effects::EffectDuration;
pub use core::effects::EffectKind;
pub use core::effects::EffectRecord;
pub use core::effects::EffectSpec;
pub use core::effects::StateOp;
pub use core::effects::TargetSelector;
pub use core::events::AggregateKind;
pub use core::events::EventKind;
pub use core::events::GovernanceEvent;
pub use core::identifiers::EffectId;
pub use core::identifiers::EventId;
pub use core::identifiers::GameId;
pub use core::identifiers::GovernorId;
pub use core::identifiers::LeagueId;
pub use core::identifiers::PlayerId;
pub use core::identifiers::ProposalId;
pub use core::identifiers::SeasonId;
pub use core::identifiers::TeamId;
pub use core::identifiers::TradeId;
pub use core::league::League;
pub use core::league::LifecycleConfig;
pub use core::league::LifecycleError;
pub use core::league::ScheduledGame;
pub use core::league::Season;
pub use core::league::SeasonPhase;
pub use core::meta::MetaBucket;
pub use core::meta::MetaEntityKind;
pub use core::meta::MetaKey;
pub use core::player::Archetype;
pub use core::player::AttributeVector;
pub use core::player::Move;
pub use core::player::MoveEffect;
pub use core::player::Player;
pub use core::proposal::Amendment;
pub use core::proposal::Interpretation;
pub use core::proposal::Proposal;
pub use core::proposal::ProposalStatus;
pub use core::proposal::TallyOutcome;
pub use core::proposal::TradeOffer;
pub use core::proposal::TradeStatus;
pub use core::proposal::Vote;
pub use core::proposal::VoteDirection;
pub use core::result::ActionType;
pub use core::result::BoxScoreLine;
pub use core::result::ElamMeta;
pub use core::result::GameResult;
pub use core::result::PlayLogEntry;
pub use core::result::PossessionOutcome;
pub use core::rules::InvalidRuleError;
pub use core::rules::RuleChange;
pub use core::rules::RuleSet;
pub use core::rules::RuleValue;
pub use core::team::ON_COURT_COUNT;
pub use core::team::Team;
pub use core::team::TeamStrategy;
pub use core::team::Venue;
pub use core::time::Timestamp;
pub use core::tokens::TokenKind;
pub use core::tokens::TokenLedger;
pub use interfaces::EventStore;
pub use interfaces::Generation;
pub use interfaces::GenerationError;
pub use interfaces::Purpose;
pub use interfaces::StoreError;
pub use interfaces::TextGenerator;
pub use interfaces::UsageRecord;
