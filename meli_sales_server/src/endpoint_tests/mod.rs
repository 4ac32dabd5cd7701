mod helpers;
mod mocks;
mod notifications;
mod queue_ops;
mod recovery;
mod status;
mod webhook;
