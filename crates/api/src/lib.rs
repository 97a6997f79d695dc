// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

pub mod challenges;
pub mod config;
pub mod db;
pub mod graphql;

#[cfg(test)]
mod testing;
