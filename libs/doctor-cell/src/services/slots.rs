// libs/doctor-cell/src/services/slots.rs

/// Bookable time-of-day labels offered every day by every doctor, in display
/// order. 12:00 and 12:30 are the lunch gap.
pub const SLOT_CATALOG: [&str; 13] = [
    "09:00 AM", "09:30 AM", "10:00 AM", "10:30 AM", "11:00 AM", "11:30 AM",
    "01:00 PM", "01:30 PM", "02:00 PM", "02:30 PM", "03:00 PM", "03:30 PM",
    "04:00 PM",
];

pub fn slot_catalog() -> &'static [&'static str] {
    &SLOT_CATALOG
}

pub fn is_catalog_slot(label: &str) -> bool {
    SLOT_CATALOG.contains(&label)
}

/// Position of `label` in the catalog; unknown labels sort last.
pub fn catalog_position(label: &str) -> usize {
    SLOT_CATALOG
        .iter()
        .position(|slot| *slot == label)
        .unwrap_or(SLOT_CATALOG.len())
}
