mod generative_converter;
mod layout_aware_converter;
mod markdown;
mod rule_based_converter;

pub use generative_converter::OpenAiGenerativeConverter;
pub use layout_aware_converter::LayoutAwareConverter;
pub use rule_based_converter::RuleBasedConverter;
