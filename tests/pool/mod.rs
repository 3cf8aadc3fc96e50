mod commission;
mod fees;
mod lifecycle;
mod properties;
