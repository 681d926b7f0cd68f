use crate::prompts;

/// The two expert modes offered by the selector. `ALL` is selector order;
/// the first entry is the startup default.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Persona {
    KokugoSensei,
    ItEngineer,
}

impl Persona {
    pub const ALL: [Self; 2] = [Self::KokugoSensei, Self::ItEngineer];

    pub const fn label(self) -> &'static str {
        match self {
            Self::KokugoSensei => "やさしい国語の先生（小学生向けに噛み砕いて説明）",
            Self::ItEngineer => "ITエンジニア（技術的に正確で、要点を箇条書き）",
        }
    }

    pub const fn instruction(self) -> &'static str {
        match self {
            Self::KokugoSensei => prompts::KOKUGO_SENSEI_INSTRUCTION,
            Self::ItEngineer => prompts::IT_ENGINEER_INSTRUCTION,
        }
    }

    // Exact match only; labels are compared as typed, not normalized.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|persona| persona.label() == label)
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::KokugoSensei => Self::ItEngineer,
            Self::ItEngineer => Self::KokugoSensei,
        }
    }
}

/// Resolves a selector label to the system instruction to send. Labels that
/// match neither persona get the plain assistant instruction; the selector
/// itself never produces such a label.
pub fn instruction_for_label(label: &str) -> &'static str {
    match Persona::from_label(label) {
        Some(persona) => persona.instruction(),
        None => prompts::PLAIN_ASSISTANT_INSTRUCTION,
    }
}

#[cfg(test)]
mod tests {
    use super::{instruction_for_label, Persona};
    use crate::prompts;

    #[test]
    fn instructions_match_enumeration() {
        assert_eq!(
            Persona::KokugoSensei.instruction(),
            prompts::KOKUGO_SENSEI_INSTRUCTION
        );
        assert_eq!(
            Persona::ItEngineer.instruction(),
            prompts::IT_ENGINEER_INSTRUCTION
        );
    }

    #[test]
    fn labels_round_trip() {
        for persona in Persona::ALL {
            assert_eq!(Persona::from_label(persona.label()), Some(persona));
        }
    }

    #[test]
    fn unknown_labels_fall_back_to_plain_assistant() {
        for label in ["宇宙飛行士", "IT engineer", ""] {
            assert_eq!(Persona::from_label(label), None);
            assert_eq!(
                instruction_for_label(label),
                prompts::PLAIN_ASSISTANT_INSTRUCTION
            );
        }
    }

    #[test]
    fn known_labels_resolve_their_instruction() {
        assert_eq!(
            instruction_for_label("ITエンジニア（技術的に正確で、要点を箇条書き）"),
            prompts::IT_ENGINEER_INSTRUCTION
        );
    }

    #[test]
    fn toggle_cycles_both_options() {
        assert_eq!(Persona::KokugoSensei.toggled(), Persona::ItEngineer);
        assert_eq!(Persona::ItEngineer.toggled(), Persona::KokugoSensei);
    }
}
