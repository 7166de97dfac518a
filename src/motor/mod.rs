// Motor layer for the differential base
//
// Provides:
// - The `SideMotor` contract the drive core talks to
// - `Drivetrain`, one motor per side with mounting inversion
// - A simulated motor for running without hardware
// - A remote motor mirrored over zenoh from the hardware bridge

mod driver;
pub mod remote;
pub mod sim;

pub use driver::{Drivetrain, SideMotor};
pub use remote::RemoteMotor;
pub use sim::SimulatedMotor;
