//! Settings that CI jobs tune through the environment.

pub mod property_test_profile;
