table! {
    addresses (id) {
        id -> Integer,
        lat -> Double,
        lon -> Double,
        numero -> Nullable<Text>,
        rue -> Nullable<Text>,
        code_postal -> Nullable<Text>,
        ville -> Text,
        display_name -> Text,
    }
}
