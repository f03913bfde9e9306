//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in wagner-core for the rover's hardware:
//!
//! - Motor drivers (H-bridge with PWM speed control)
//! - Distance sensors (HC-SR04 ultrasonic ranger)
//! - Radios (ESP8266/ESP32 modem running ESP-AT firmware)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod motor;
pub mod radio;
pub mod sensor;
