mod timer;

pub use timer::MockTimer;
