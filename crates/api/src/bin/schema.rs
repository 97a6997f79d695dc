// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use juniper::{EmptySubscription, RootNode};

use hostonhome_api::graphql::{Context, Mutation, Query};

fn main() {
    let schema = RootNode::new(Query, Mutation, EmptySubscription::<Context>::new());

    let result = schema.as_sdl();

    std::fs::write("schema.gql", result).expect("Unable to write schema file");
}
