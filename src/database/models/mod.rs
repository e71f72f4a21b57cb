pub mod account;
pub mod testimonial;

pub use account::{Account, NewAccount};
pub use testimonial::{NewTestimonial, Testimonial, TestimonialChanges, LOCATION_MAX_LEN};
