use super::dictionary::{Dictionary, SortedDictionary};

#[test]
fn codes_follow_value_order() {
    let dict = SortedDictionary::from_values("country", ["us", "cn", "de", "us"]).unwrap();
    assert_eq!(dict.cardinality(), 3);
    assert_eq!(dict.id_of("cn"), Some(0));
    assert_eq!(dict.id_of("de"), Some(1));
    assert_eq!(dict.id_of("us"), Some(2));
    assert_eq!(dict.id_of("fr"), None);
    assert_eq!(dict.value_of(1), Some("de"));
    assert_eq!(dict.value_of(3), None);
}

#[test]
fn code_width_grows_with_cardinality() {
    let small = SortedDictionary::from_values("d", (0..256).map(|i| format!("{i:05}"))).unwrap();
    assert_eq!(small.size_of_id(), 1);

    let medium = SortedDictionary::from_values("d", (0..257).map(|i| format!("{i:05}"))).unwrap();
    assert_eq!(medium.size_of_id(), 2);

    let empty = SortedDictionary::from_values("d", Vec::<String>::new()).unwrap();
    assert_eq!(empty.size_of_id(), 1);
}
