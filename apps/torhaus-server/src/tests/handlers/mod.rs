mod invites;
mod reservations;
