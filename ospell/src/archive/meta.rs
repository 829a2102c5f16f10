//! `index.xml` of a zhfst archive.
use serde::{Deserialize, Serialize};
use serde_xml_rs::{from_reader, Error, ParserConfig};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SpellerMetadata {
    pub info: SpellerMetadataInfo,
    pub acceptor: SpellerMetadataAcceptor,
    pub errmodel: SpellerMetadataErrmodel,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SpellerTitle {
    pub lang: Option<String>,
    #[serde(rename = "$value")]
    pub value: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SpellerMetadataInfo {
    pub locale: String,
    #[serde(default)]
    pub title: Vec<SpellerTitle>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub producer: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SpellerMetadataAcceptor {
    #[serde(rename = "type", default)]
    pub type_: String,
    pub id: String,
    #[serde(default)]
    pub title: Vec<SpellerTitle>,
    #[serde(default)]
    pub description: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SpellerMetadataErrmodel {
    pub id: String,
    #[serde(default)]
    pub title: Vec<SpellerTitle>,
    #[serde(default)]
    pub description: String,
}

impl std::str::FromStr for SpellerMetadata {
    type Err = Error;

    fn from_str(string: &str) -> Result<SpellerMetadata, Error> {
        SpellerMetadata::from_bytes(string.as_bytes())
    }
}

impl SpellerMetadata {
    pub fn from_bytes(bytes: &[u8]) -> Result<SpellerMetadata, Error> {
        let mut reader = ParserConfig::new()
            .trim_whitespace(true)
            .ignore_comments(true)
            .coalesce_characters(true)
            .create_reader(bytes)
            .into_inner();

        from_reader(&mut reader)
    }

    pub fn locale(&self) -> &str {
        &self.info.locale
    }

    /// Archive entry holding the lexicon.
    pub fn acceptor_id(&self) -> &str {
        &self.acceptor.id
    }

    /// Archive entry holding the error model.
    pub fn errmodel_id(&self) -> &str {
        &self.errmodel.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parses_index_xml() {
        let xml_data = r##"<?xml version="1.0" encoding="UTF-8"?>
            <hfstspeller dtdversion="1.0" hfstversion="3">
            <info>
                <locale>uz</locale>
                <title>Uzbek speller</title>
                <title lang="uz">O'zbek imlo tekshiruvchisi</title>
                <description>Test speller for Uzbek.</description>
                <version vcsrev="REV">VERSION</version>
                <producer>ospell contributors</producer>
            </info>
            <acceptor type="general" id="acceptor.default.hfst">
                <title>Uzbek dictionary</title>
                <description>Uzbek dictionary compiled for HFST.</description>
            </acceptor>
            <errmodel id="errmodel.default.hfst">
                <title>Levenshtein edit distance transducer</title>
                <description>Correction model for keyboard misstrokes.</description>
                <type type="default"/>
                <model>errormodel.default.hfst</model>
            </errmodel>
            </hfstspeller>
        "##;

        let s = SpellerMetadata::from_str(xml_data).unwrap();

        assert_eq!(s.locale(), "uz");
        assert_eq!(s.acceptor_id(), "acceptor.default.hfst");
        assert_eq!(s.errmodel_id(), "errmodel.default.hfst");
        assert_eq!(s.acceptor.type_, "general");
        assert_eq!(s.info.title.len(), 2);
        assert_eq!(s.info.title[1].lang.as_deref(), Some("uz"));
    }

    #[test]
    fn rejects_missing_models() {
        let xml_data = "<hfstspeller><info><locale>uz</locale></info></hfstspeller>";
        assert!(SpellerMetadata::from_str(xml_data).is_err());
    }
}
