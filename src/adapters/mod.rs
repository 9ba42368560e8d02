//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements  | Connects to                              |
//! |------------|-------------|------------------------------------------|
//! | `gpio`     | DigitalIo   | any `embedded-hal` pins (rppal on the Pi)|
//! | `sim`      | DigitalIo   | in-memory levels, logged                 |
//! |            | SoundPort   | log output only                          |
//! | `sound`    | SoundPort   | WAV mixer, cpal output stream            |
//! | `log_sink` | EventSink   | log output                               |
//! | `time`     | ClockPort   | `std::time::Instant`                     |

pub mod gpio;
pub mod log_sink;
pub mod sim;
pub mod sound;
pub mod time;
