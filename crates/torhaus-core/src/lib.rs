//! Domain logic for torhaus: the invite-link lifecycle and the reservation
//! intake workflow, both written against the [`torhaus_storage::Store`]
//! trait so any transactional backend can carry them.

pub mod invites;
pub mod reservations;

pub use invites::{
    Expiry, InvalidReason, InviteError, InviteService, InviteValidation, IssueOptions,
    IssuedInvite,
};
pub use reservations::{
    NewReservation, ReservationError, ReservationIntake, ValidationIssue,
};
