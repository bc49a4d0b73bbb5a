#![warn(missing_docs)]
//! Domain models and interface traits for a timed, multi-bidder auction
//! engine: the authoritative price and lifecycle state of each auction,
//! the rules for accepting bids under concurrent access, and the ports
//! through which stores, payment providers, and transports plug in.

/// Core domain models for the auction engine.
///
/// The structures in this module carry the pure pricing and lifecycle
/// arithmetic of an auction (minimum increments, close outcomes,
/// remaining time) but perform no I/O, following the hexagonal split
/// between domain entities and their persistence.
pub mod models;

/// Interface traits for the auction engine.
///
/// These are the "ports": the contracts between the domain logic and
/// external adapters (the record store, the payment settlement service)
/// without committing to an implementation. Implementations are
/// expected to linearize all mutations of a single auction record
/// relative to each other; operations on different auctions must not
/// block one another.
pub mod ports;
