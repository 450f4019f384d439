//! Command handlers grouped by screen.

pub(crate) mod categories;
pub(crate) mod guides;
pub(crate) mod newsletter;
pub(crate) mod subscriptions;
pub(crate) mod tickets;
pub(crate) mod users;
