//! The hardware seam: drone control, camera frames, and the display sink.
//!
//! The engine drives flight through the [`Drone`] trait and rendering through
//! [`DisplaySink`], so programs run identically against simulated hardware and
//! a real airframe. All calls are synchronous and blocking; retry and timeout
//! policy belongs to trait implementations, not to the engine.

use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// A failure reported by the drone hardware (or its simulation).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct HardwareFault(pub String);

impl HardwareFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// An opaque captured camera frame.
///
/// Pixel data is reference-counted, so copying a picture between registers or
/// stacks never clones the frame itself.
#[derive(Clone, Debug, PartialEq)]
pub struct Picture {
    width: u32,
    height: u32,
    data: Arc<Vec<u8>>,
}

impl Picture {
    /// Wraps raw RGB pixel data (`width * height * 3` bytes).
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: Arc::new(data),
        }
    }

    /// An all-black frame, the output of the simulated camera.
    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(width, height, vec![0; (width * height * 3) as usize])
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// An opaque detected-face handle, reserved for the vision subsystem.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Face {
    id: u64,
}

impl Face {
    pub fn new(id: u64) -> Self {
        Self { id }
    }
}

/// Drone flight and camera control.
///
/// Motion magnitudes are whole units (the engine truncates fractional operand
/// values before dispatch). `shutdown` is called on every engine exit path,
/// including failures, and must be safe to call in any state.
pub trait Drone {
    fn connect(&mut self) -> Result<(), HardwareFault>;
    fn shutdown(&mut self);
    fn takeoff(&mut self) -> Result<(), HardwareFault>;
    fn land(&mut self) -> Result<(), HardwareFault>;
    fn forward(&mut self, units: i64) -> Result<(), HardwareFault>;
    fn backward(&mut self, units: i64) -> Result<(), HardwareFault>;
    fn left(&mut self, units: i64) -> Result<(), HardwareFault>;
    fn right(&mut self, units: i64) -> Result<(), HardwareFault>;
    fn up(&mut self, units: i64) -> Result<(), HardwareFault>;
    fn down(&mut self, units: i64) -> Result<(), HardwareFault>;
    fn rotate_cw(&mut self, degrees: i64) -> Result<(), HardwareFault>;
    fn rotate_ccw(&mut self, degrees: i64) -> Result<(), HardwareFault>;
    fn take_picture(&mut self) -> Result<Picture, HardwareFault>;
}

/// A value resolved by the engine for the display sink to render.
#[derive(Clone, Debug, PartialEq)]
pub enum DisplayValue<'a> {
    Number(f64),
    Text(&'a str),
    Picture(&'a Picture),
}

/// Receives `DISPLAY` output.
pub trait DisplaySink {
    fn render(&mut self, value: DisplayValue<'_>);
}

/// Formats a number the way `DISPLAY` prints it: integral values without a
/// fractional part, everything else in `f64` default notation.
pub fn fmt_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

impl fmt::Display for DisplayValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayValue::Number(n) => write!(f, "{}", fmt_number(*n)),
            DisplayValue::Text(s) => write!(f, "{s}"),
            DisplayValue::Picture(p) => write!(f, "[picture {}x{}]", p.width(), p.height()),
        }
    }
}

/// Renders display output to stdout, one value per line.
#[derive(Debug, Default)]
pub struct StdoutDisplay;

impl DisplaySink for StdoutDisplay {
    fn render(&mut self, value: DisplayValue<'_>) {
        println!("{value}");
    }
}

/// Simulated camera resolution.
const FRAME_WIDTH: u32 = 100;
const FRAME_HEIGHT: u32 = 100;

/// A software drone flying in a simple planar model.
///
/// Position is tracked in units on x/y/z with a facing angle in radians
/// (zero along +x, counter-clockwise positive). Horizontal motion is
/// projected through the facing angle, so a program that rotates and then
/// flies forward traces the turned path. The drone records its position
/// after every motion command; [`SimulatedDrone::path`] replays the flight.
#[derive(Debug, Clone)]
pub struct SimulatedDrone {
    x: f64,
    y: f64,
    z: f64,
    facing: f64,
    connected: bool,
    flying: bool,
    path: Vec<[f64; 3]>,
}

impl SimulatedDrone {
    pub fn new() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            facing: 0.0,
            connected: false,
            flying: false,
            path: vec![[0.0, 0.0, 0.0]],
        }
    }

    /// Every position the drone has occupied, starting at the origin.
    pub fn path(&self) -> &[[f64; 3]] {
        &self.path
    }

    pub fn position(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Facing angle in radians.
    pub fn facing(&self) -> f64 {
        self.facing
    }

    fn check_flying(&self) -> Result<(), HardwareFault> {
        if !self.connected {
            return Err(HardwareFault::new("drone is not connected"));
        }
        if !self.flying {
            return Err(HardwareFault::new("drone is not airborne"));
        }
        Ok(())
    }

    fn displace(&mut self, units: i64, heading: f64) -> Result<(), HardwareFault> {
        self.check_flying()?;
        self.x += units as f64 * heading.cos();
        self.y += units as f64 * heading.sin();
        self.record();
        Ok(())
    }

    fn record(&mut self) {
        self.path.push([self.x, self.y, self.z]);
    }
}

impl Default for SimulatedDrone {
    fn default() -> Self {
        Self::new()
    }
}

impl Drone for SimulatedDrone {
    fn connect(&mut self) -> Result<(), HardwareFault> {
        self.connected = true;
        Ok(())
    }

    fn shutdown(&mut self) {
        self.connected = false;
        self.flying = false;
    }

    fn takeoff(&mut self) -> Result<(), HardwareFault> {
        if !self.connected {
            return Err(HardwareFault::new("drone is not connected"));
        }
        self.flying = true;
        Ok(())
    }

    fn land(&mut self) -> Result<(), HardwareFault> {
        if !self.connected {
            return Err(HardwareFault::new("drone is not connected"));
        }
        self.flying = false;
        Ok(())
    }

    fn forward(&mut self, units: i64) -> Result<(), HardwareFault> {
        self.displace(units, self.facing)
    }

    fn backward(&mut self, units: i64) -> Result<(), HardwareFault> {
        self.displace(-units, self.facing)
    }

    fn left(&mut self, units: i64) -> Result<(), HardwareFault> {
        self.displace(units, self.facing + PI / 2.0)
    }

    fn right(&mut self, units: i64) -> Result<(), HardwareFault> {
        self.displace(units, self.facing - PI / 2.0)
    }

    fn up(&mut self, units: i64) -> Result<(), HardwareFault> {
        self.check_flying()?;
        self.z += units as f64;
        self.record();
        Ok(())
    }

    fn down(&mut self, units: i64) -> Result<(), HardwareFault> {
        self.check_flying()?;
        self.z -= units as f64;
        self.record();
        Ok(())
    }

    fn rotate_cw(&mut self, degrees: i64) -> Result<(), HardwareFault> {
        self.check_flying()?;
        self.facing -= (degrees as f64).to_radians();
        self.record();
        Ok(())
    }

    fn rotate_ccw(&mut self, degrees: i64) -> Result<(), HardwareFault> {
        self.check_flying()?;
        self.facing += (degrees as f64).to_radians();
        self.record();
        Ok(())
    }

    fn take_picture(&mut self) -> Result<Picture, HardwareFault> {
        if !self.connected {
            return Err(HardwareFault::new("drone is not connected"));
        }
        Ok(Picture::blank(FRAME_WIDTH, FRAME_HEIGHT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn approx(a: [f64; 3], b: [f64; 3]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < EPS)
    }

    fn airborne() -> SimulatedDrone {
        let mut drone = SimulatedDrone::new();
        drone.connect().unwrap();
        drone.takeoff().unwrap();
        drone
    }

    #[test]
    fn motion_requires_takeoff() {
        let mut drone = SimulatedDrone::new();
        drone.connect().unwrap();
        assert!(drone.forward(5).is_err());
        drone.takeoff().unwrap();
        assert!(drone.forward(5).is_ok());
    }

    #[test]
    fn forward_moves_along_facing() {
        let mut drone = airborne();
        drone.forward(10).unwrap();
        assert!(approx(drone.position(), [10.0, 0.0, 0.0]));
        drone.backward(4).unwrap();
        assert!(approx(drone.position(), [6.0, 0.0, 0.0]));
    }

    #[test]
    fn strafing_is_perpendicular_to_facing() {
        let mut drone = airborne();
        drone.left(3).unwrap();
        assert!(approx(drone.position(), [0.0, 3.0, 0.0]));
        drone.right(5).unwrap();
        assert!(approx(drone.position(), [0.0, -2.0, 0.0]));
    }

    #[test]
    fn rotation_changes_heading() {
        let mut drone = airborne();
        drone.rotate_ccw(90).unwrap();
        drone.forward(10).unwrap();
        assert!(approx(drone.position(), [0.0, 10.0, 0.0]));
        drone.rotate_cw(90).unwrap();
        drone.forward(2).unwrap();
        assert!(approx(drone.position(), [2.0, 10.0, 0.0]));
    }

    #[test]
    fn vertical_motion() {
        let mut drone = airborne();
        drone.up(7).unwrap();
        drone.down(2).unwrap();
        assert!(approx(drone.position(), [0.0, 0.0, 5.0]));
    }

    #[test]
    fn path_records_every_motion() {
        let mut drone = airborne();
        drone.forward(10).unwrap();
        drone.up(5).unwrap();
        let path = drone.path();
        assert_eq!(path.len(), 3);
        assert!(approx(path[0], [0.0, 0.0, 0.0]));
        assert!(approx(path[1], [10.0, 0.0, 0.0]));
        assert!(approx(path[2], [10.0, 0.0, 5.0]));
    }

    #[test]
    fn camera_returns_blank_frame() {
        let mut drone = SimulatedDrone::new();
        assert!(drone.take_picture().is_err());
        drone.connect().unwrap();
        let pic = drone.take_picture().unwrap();
        assert_eq!(pic.width(), 100);
        assert_eq!(pic.height(), 100);
    }

    #[test]
    fn fmt_number_drops_integral_fraction() {
        assert_eq!(fmt_number(3.0), "3");
        assert_eq!(fmt_number(-12.0), "-12");
        assert_eq!(fmt_number(0.0), "0");
        assert_eq!(fmt_number(3.5), "3.5");
        assert_eq!(fmt_number(-0.25), "-0.25");
    }

    #[test]
    fn display_value_formatting() {
        assert_eq!(DisplayValue::Number(4.0).to_string(), "4");
        assert_eq!(DisplayValue::Text("HELLO").to_string(), "HELLO");
        let pic = Picture::blank(100, 100);
        assert_eq!(DisplayValue::Picture(&pic).to_string(), "[picture 100x100]");
    }
}
