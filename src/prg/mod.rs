pub mod markers;
pub mod string;

pub use markers::{
    decode_dna_base, decode_dna_bases, encode_dna_base, encode_dna_bases, is_allele_marker,
    is_base, is_site_marker, reverse_complement, AlleleId, Base, Marker, Pattern, Symbol,
    VariantLocus, ALLELE_UNKNOWN, FIRST_MARKER,
};
pub use string::{Endianness, PrgString};
