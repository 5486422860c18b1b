// This file is part of RadarStore.
//
// Copyright (C) 2025 Matheus Cardoso <varvedb@matheus.sbs>
//
// This Source Code Form is subject to the terms of the Mozilla Public License
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at http://mozilla.org/MPL/2.0/.

//! Utility macros for RadarStore.

/// Times the execution of a block and prints the elapsed time to stderr.
///
/// Output has the form `[radar] {label}: {duration:?}` and is only produced in
/// debug builds with the `debug_eprintln` feature enabled. Otherwise the macro
/// expands to the bare block.
///
/// # Examples
///
/// ```ignore
/// use radar_store::timed_dbg;
///
/// let seq = timed_dbg!("allocate", allocator.next("Message"))?;
/// ```
#[macro_export]
#[cfg(all(debug_assertions, feature = "debug_eprintln"))]
macro_rules! timed_dbg {
    ($label:expr, $block:expr) => {{
        let __timed_start = ::std::time::Instant::now();
        let __timed_result = $block;
        ::std::eprintln!("[radar] {}: {:?}", $label, __timed_start.elapsed());
        __timed_result
    }};
}

#[macro_export]
#[cfg(not(all(debug_assertions, feature = "debug_eprintln")))]
macro_rules! timed_dbg {
    ($label:expr, $block:expr) => {
        $block
    };
}
