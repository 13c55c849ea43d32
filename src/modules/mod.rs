pub(crate) mod wallet;
