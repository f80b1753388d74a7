//! Opcodes and decoded values used by the client itself
//!
//! The full device catalogue lives with higher-level callers. Only the codes
//! the connection layer and its formatter registry need are listed here.

/// Null command, used to verify a connection
pub const TEST: &str = "\0\0";

pub const POWER: &str = "PW";
pub const INPUT: &str = "IP";
pub const SOURCE: &str = "SC";
pub const MODEL: &str = "MD";
pub const REMOTE: &str = "RC";
pub const MAC: &str = "LSMA";
pub const LAN_IP_ADDRESS: &str = "LSIP";
pub const VERSION: &str = "IFSV";
pub const LASER_TIME: &str = "IFLT";
pub const PICTURE_MODE: &str = "PMPM";
pub const LOW_LATENCY: &str = "PMLL";
pub const LASER_POWER: &str = "PMLP";
pub const CLEAR_MOTION_DRIVE: &str = "PMCM";

// Power states
pub const STANDBY: &str = "standby";
pub const ON: &str = "on";
pub const COOLING: &str = "cooling";
pub const WARMING: &str = "warming";
pub const ERROR: &str = "error";

pub const OFF: &str = "off";
