//! Safe primes for tests, generating them takes long

/// 1024 bit safe primes, the size used for credential definitions
pub const SAFE_PRIME_1024_P: &str = "159663830006192343628832176086664217527380934456475779601814130663061317571711620809929747969153892896127502589864524826832695286767245890065145982563784474852347915078662817304022449180805102203391616375196455443307835663647173573721856813703317750260632263907345431011604548307016944815141487837510397074799";
pub const SAFE_PRIME_1024_Q: &str = "136298308661571571359550800475841505911006926870655322362968261893090801329275069766144879997031801236510623305428480380526231854585399123743299941999744907576452871479019326831813797672277734596849404514506712935255813653242273762533176694791604485560876074098375502634140700180660692543058896250076709325647";

/// A second pair for tests needing two issuers
pub const SAFE_PRIME_1024_P2: &str = "176819063668356898947472721357825615683710266633313807773838247557326636686755525856083040207029087142313811432545951371691971817635150862209363652987960851315490688999376943280332966898189909346021616167255425158648317808348835866865873564647993902931162467154696975749334882434120572998277011772613479183467";
pub const SAFE_PRIME_1024_Q2: &str = "168615718684811413843568861998948495048969640348051836436741878915449264859055362484267325600839457042466629893766254825823690974429050604560187469780657895816721779842131885248944120896145333981716108559294741926198863517151116937019712108827409662174267389654473049098772833586498291523115590241180508263159";

/// Small safe primes, insecure, for tests of the modulus arithmetic only
pub const SAFE_PRIME_128_P: &str = "256250560732891434694417412787562680539";
pub const SAFE_PRIME_128_Q: &str = "325459356798719166158612875383394825103";
