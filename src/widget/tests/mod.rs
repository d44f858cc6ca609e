mod helpers;
mod positioning_session;
mod spin_session;
