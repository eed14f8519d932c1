//! Word material for the human-readable API-key format.
//!
//! Segment entropy: prefix and suffix contribute 2 bits each, each adjective
//! and the noun 7 bits, the hex block 96 bits.

pub(super) const PREFIXES: [&str; 4] = ["depot", "pkg", "reg", "art"];

pub(super) const SUFFIXES: [&str; 4] = ["key", "gate", "seal", "vault"];

pub(super) const ADJECTIVES: [&str; 128] = [
    "amber", "ancient", "arid", "autumn", "azure", "bold", "brave", "bright",
    "brisk", "bronze", "calm", "candid", "cedar", "chill", "civil", "clear",
    "clever", "cloudy", "cobalt", "cool", "copper", "coral", "cosmic", "crimson",
    "crisp", "curious", "daring", "dawn", "deep", "dense", "dusky", "eager",
    "early", "earnest", "ebony", "electric", "elegant", "emerald", "faded", "fair",
    "fancy", "fast", "fearless", "fierce", "fine", "firm", "floral", "fluent",
    "fresh", "frosty", "gentle", "gilded", "glad", "golden", "grand", "green",
    "happy", "hardy", "hazel", "hidden", "high", "honest", "humble", "icy",
    "indigo", "iron", "ivory", "jade", "jolly", "keen", "kind", "late",
    "lively", "lone", "loud", "loyal", "lucid", "lunar", "mellow", "merry",
    "mighty", "misty", "modern", "mossy", "neat", "nimble", "noble", "northern",
    "oaken", "olive", "opal", "pale", "patient", "pearl", "plain", "polar",
    "proud", "purple", "quick", "quiet", "rapid", "rare", "ripe", "rosy",
    "royal", "rugged", "rustic", "sable", "sandy", "scarlet", "sharp", "silent",
    "silver", "sleek", "smooth", "snowy", "solar", "solid", "stable", "steady",
    "stormy", "sunny", "swift", "tidal", "tranquil", "vivid", "warm", "wild",
];

pub(super) const NOUNS: [&str; 128] = [
    "anchor", "anvil", "arrow", "badger", "banner", "basin", "beacon", "bell",
    "birch", "bison", "bridge", "brook", "canyon", "castle", "cavern", "cliff",
    "comet", "compass", "condor", "crane", "crater", "creek", "crow", "dagger",
    "delta", "desert", "drift", "eagle", "ember", "falcon", "fern", "ferry",
    "field", "finch", "fjord", "flint", "forest", "forge", "fox", "gale",
    "garnet", "geyser", "glacier", "glade", "grove", "gull", "harbor", "hawk",
    "heron", "hill", "hollow", "island", "jaguar", "juniper", "kestrel", "knoll",
    "lagoon", "lake", "lantern", "larch", "lark", "ledge", "lemur", "lichen",
    "lily", "linden", "lynx", "maple", "marsh", "meadow", "mesa", "mill",
    "mineral", "mole", "moose", "moss", "mountain", "needle", "nest", "oak",
    "oasis", "ocean", "orca", "osprey", "otter", "owl", "panther", "peak",
    "pebble", "pine", "plateau", "pond", "poppy", "prairie", "puffin", "quarry",
    "quartz", "raven", "reef", "ridge", "river", "robin", "rowan", "saddle",
    "salmon", "sequoia", "shore", "sparrow", "spring", "spruce", "summit", "swan",
    "thicket", "thorn", "tiger", "timber", "trail", "tulip", "tundra", "valley",
    "vine", "walnut", "waterfall", "weasel", "willow", "wolf", "wren", "zephyr",
];
