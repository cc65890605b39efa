mod commit_tally;
mod pending_endorsements;
