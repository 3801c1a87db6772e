use super::*;

#[test]
fn stars_fill_up_to_the_rating() {
    assert_eq!(stars(0), "☆☆☆☆☆");
    assert_eq!(stars(3), "★★★☆☆");
}

#[test]
fn stars_clamp_out_of_range_ratings() {
    assert_eq!(stars(9), "★★★★★");
}
