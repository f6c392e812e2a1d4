//! Static table of the platform's published error codes.
//!
//! # Design
//! The remote API reports failures as bare numeric codes without any
//! description, so every message a caller sees comes from this table. The
//! table is a `const` slice: read-only, process-wide, and never mutated.
//!
//! The published list defines code `2907` twice ("NULL criteria provided for
//! update." and "NULL criteria provided for view."). Only the later entry is
//! kept, which is the one clients of the platform have always observed.

/// Code the platform uses when an update or view matched no records.
pub const NO_RECORDS_FOUND_CODE: &str = "2902";

/// Every `(code, message)` pair known to the catalog.
pub const ENTRIES: &[(&str, &str)] = &[
    ("2830", "Invalid XML."),
    ("2831", "Missing apikey in the request."),
    ("2832", "Missing application owner in the request."),
    ("2833", "Missing application name in the request."),
    ("2834", "Missing form name in the request."),
    ("2835", "Missing view name in the request."),
    ("2836", "Missing operation in the request."),
    ("2890", "Invalid apikey."),
    ("2891", "Invalid application owner."),
    ("2892", "Invalid application name."),
    ("2893", "Invalid form name."),
    ("2894", "Invalid view name."),
    ("2895", "Invalid operation."),
    ("2896", "Permission denied to delete records."),
    ("2897", "Permission denied to update records."),
    ("2898", "Permission denied to view records."),
    ("2899", "Permission denied to add records."),
    ("2900", "Invalid column name."),
    ("2901", "Invalid Operator."),
    (NO_RECORDS_FOUND_CODE, "No records found with specified criteria."),
    (
        "2903",
        "Incomplete criteria. The final relational operator must end with a dot(.)",
    ),
    ("2904", "Value specified for formula field."),
    ("2905", "Error occured while fetching data. Your data is safe."),
    ("2906", "NULL criteria provided for delete."),
    ("2907", "NULL criteria provided for view."),
    ("2909", "Get request not supported."),
    ("2910", "Invalid Email-id."),
    ("2911", "No access."),
    ("2912", "No such user."),
    ("2913", "Invalid ticket."),
    ("2914", "Private and shared applications cannot be copied."),
    ("2915", "Limit should not exceed 5000."),
    ("2917", "You must login to access this API."),
];

/// Resolve a numeric error code to its description. Unknown codes yield `None`.
pub fn lookup(code: &str) -> Option<&'static str> {
    ENTRIES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, message)| *message)
}
