diesel::table! {
    packages (id) {
        id -> Integer,
        filename -> Text,
        name -> Text,
        base -> Nullable<Text>,
        version -> Text,
        description -> Nullable<Text>,
        url -> Nullable<Text>,
        arch -> Text,
        packager -> Text,
        build_date -> BigInt,
        repo -> Text,
    }
}

diesel::table! {
    sync_state (repo) {
        repo -> Text,
        snapshot_digest -> Text,
        package_count -> BigInt,
        synced_at -> BigInt,
    }
}

diesel::allow_tables_to_appear_in_same_query!(packages, sync_state);
