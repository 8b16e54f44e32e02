pub mod earl {
    use oxigraph::model::NamedNodeRef;

    pub const NAMESPACE: &str = "http://www.w3.org/ns/earl#";
    pub const ASSERTION: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/earl#Assertion");
    pub const ASSERTED_BY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/earl#assertedBy");
    pub const AUTOMATIC: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/earl#automatic");
    pub const FAILED: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/earl#failed");
    pub const MODE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/earl#mode");
    pub const OUTCOME: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/earl#outcome");
    pub const PASSED: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/earl#passed");
    pub const RESULT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/earl#result");
    pub const SOFTWARE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/earl#Software");
    pub const SUBJECT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/earl#subject");
    pub const TEST: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/earl#test");
    pub const TEST_RESULT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/earl#TestResult");
    pub const TEST_SUBJECT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/earl#TestSubject");
}

pub mod doap {
    use oxigraph::model::NamedNodeRef;

    pub const NAMESPACE: &str = "http://usefulinc.com/ns/doap#";
    pub const HOMEPAGE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://usefulinc.com/ns/doap#homepage");
    pub const NAME: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://usefulinc.com/ns/doap#name");
    pub const PROJECT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://usefulinc.com/ns/doap#Project");
}

pub mod dc {
    use oxigraph::model::NamedNodeRef;

    pub const NAMESPACE: &str = "http://purl.org/dc/terms/";
    pub const DATE: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("http://purl.org/dc/terms/date");
}

pub mod xsd {
    pub const NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema#";
}
